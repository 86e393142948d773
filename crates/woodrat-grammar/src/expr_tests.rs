use crate::{ByteSet, Expr, ExprPool};

#[test]
fn interning_shares_equal_subtrees() {
    let mut pool = ExprPool::new();

    let a1 = pool.intern(Expr::Byte(b'a'));
    let a2 = pool.intern(Expr::Byte(b'a'));
    let b = pool.intern(Expr::Byte(b'b'));

    assert_eq!(a1, a2);
    assert_ne!(a1, b);

    let seq1 = pool.intern(Expr::Seq(vec![a1, b]));
    let seq2 = pool.intern(Expr::Seq(vec![a2, b]));
    assert_eq!(seq1, seq2);
    assert_eq!(pool.len(), 3);
}

#[test]
fn composite_nodes_differ_from_leaves() {
    let mut pool = ExprPool::new();

    let digit = pool.intern(Expr::Class(ByteSet::range(b'0', b'9')));
    let star = pool.intern(Expr::Star(digit));
    let plus = pool.intern(Expr::Plus(digit));

    assert_ne!(star, plus);
    assert_ne!(star, digit);
}

#[test]
fn children_iterate_in_evaluation_order() {
    let mut pool = ExprPool::new();

    let a = pool.intern(Expr::Byte(b'a'));
    let b = pool.intern(Expr::Byte(b'b'));
    let seq = pool.intern(Expr::Seq(vec![a, b]));
    let star = pool.intern(Expr::Star(seq));

    let kids: Vec<_> = pool.get(seq).children().collect();
    assert_eq!(kids, [a, b]);

    let kids: Vec<_> = pool.get(star).children().collect();
    assert_eq!(kids, [seq]);

    assert_eq!(pool.get(a).children().count(), 0);
}

//! Recursive traversal engine
//!
//! The algorithms here are the only code that descends into nested
//! sublists. Every walk operates in reference coordinates: for a source
//! node with key `k` at recursion depth `rec`, the logical index is
//! `k - offset(rec)`, a node is in range iff that index is below
//! `ref_shape(rec)`, and every cursor advances in non-decreasing index
//! order. Walks over two storages merge their cursors on reference index
//! so the two sides stay aligned even when their offsets differ.

use core::cmp::Ordering;

use lols_core::MatrixValue;

use crate::list::{Link, List, Node, Value};
use crate::recurse::RecurseState;

/// Advance a read cursor past keys below the window start
fn skip_below<T>(mut cur: Option<&Node<T>>, offset: usize) -> Option<&Node<T>> {
    while let Some(node) = cur {
        if node.key >= offset {
            break;
        }
        cur = node.next.as_deref();
    }
    cur
}

/// Null a read cursor whose reference index has left the window
fn clamp<T>(cur: Option<&Node<T>>, offset: usize, shape: usize) -> Option<&Node<T>> {
    cur.filter(|node| node.key - offset < shape)
}

/// Position a read cursor at the first in-window node
fn enter<T>(list: &List<T>, offset: usize, shape: usize) -> Option<&Node<T>> {
    clamp(skip_below(list.first.as_deref(), offset), offset, shape)
}

/// One step of a merged two-sided walk
enum Step<'a, L, R> {
    Left(&'a Node<L>),
    Right(&'a Node<R>),
    Both(&'a Node<L>, &'a Node<R>),
}

/// Pick the side (or sides) holding the smallest reference index
fn next_step<'a, L, R>(
    lcur: Option<&'a Node<L>>,
    rcur: Option<&'a Node<R>>,
    loff: usize,
    roff: usize,
) -> Option<Step<'a, L, R>> {
    match (lcur, rcur) {
        (None, None) => None,
        (Some(ln), None) => Some(Step::Left(ln)),
        (None, Some(rn)) => Some(Step::Right(rn)),
        (Some(ln), Some(rn)) => Some(match (ln.key - loff).cmp(&(rn.key - roff)) {
            Ordering::Less => Step::Left(ln),
            Ordering::Greater => Step::Right(rn),
            Ordering::Equal => Step::Both(ln, rn),
        }),
    }
}

/// Append at the tail cursor of a list under construction
fn push_tail<T>(tail: &mut Link<T>, key: usize, val: Value<T>) -> &mut Link<T> {
    *tail = Some(Box::new(Node {
        key,
        val,
        next: None,
    }));
    match tail {
        Some(node) => &mut node.next,
        None => unreachable!("push produced no node"),
    }
}

/// Content equality of two aligned lists
///
/// A node present on one side only compares against the other side's
/// default. When the walk never produced a single comparison, the sides
/// are equal iff their defaults are.
pub(crate) fn eq_lists<L, R, F>(
    left: &RecurseState<'_, L>,
    right: &RecurseState<'_, R>,
    l: &List<L>,
    r: &List<R>,
    rec: usize,
    eq: &F,
) -> bool
where
    L: MatrixValue,
    R: MatrixValue,
    F: Fn(&L, &R) -> bool,
{
    let loff = left.offset(rec);
    let roff = right.offset(rec);
    let lshape = left.ref_shape(rec);
    let rshape = right.ref_shape(rec);

    let mut lcur = enter(l, loff, lshape);
    let mut rcur = enter(r, roff, rshape);
    let mut compared = false;

    while let Some(step) = next_step(lcur, rcur, loff, roff) {
        match step {
            Step::Left(ln) => {
                let ok = if rec > 0 {
                    eq_lone(left, ln.val.as_sub(), rec - 1, right.init(), &|v, init| {
                        eq(v, init)
                    })
                } else {
                    eq(ln.val.as_scalar(), right.init())
                };
                if !ok {
                    return false;
                }
                lcur = clamp(ln.next.as_deref(), loff, lshape);
            }
            Step::Right(rn) => {
                let ok = if rec > 0 {
                    eq_lone(right, rn.val.as_sub(), rec - 1, left.init(), &|v, init| {
                        eq(init, v)
                    })
                } else {
                    eq(left.init(), rn.val.as_scalar())
                };
                if !ok {
                    return false;
                }
                rcur = clamp(rn.next.as_deref(), roff, rshape);
            }
            Step::Both(ln, rn) => {
                let ok = if rec > 0 {
                    eq_lists(left, right, ln.val.as_sub(), rn.val.as_sub(), rec - 1, eq)
                } else {
                    eq(ln.val.as_scalar(), rn.val.as_scalar())
                };
                if !ok {
                    return false;
                }
                lcur = clamp(ln.next.as_deref(), loff, lshape);
                rcur = clamp(rn.next.as_deref(), roff, rshape);
            }
        }
        compared = true;
    }

    if !compared {
        return eq(left.init(), right.init());
    }
    true
}

/// Equality helper for a subtree present on one side only
///
/// Every stored leaf of the subtree must equal the other side's default.
fn eq_lone<S, O, F>(
    s: &RecurseState<'_, S>,
    l: &List<S>,
    rec: usize,
    other_init: &O,
    eq: &F,
) -> bool
where
    S: MatrixValue,
    F: Fn(&S, &O) -> bool,
{
    let off = s.offset(rec);
    let shape = s.ref_shape(rec);

    let mut cur = enter(l, off, shape);
    while let Some(node) = cur {
        let ok = if rec > 0 {
            eq_lone(s, node.val.as_sub(), rec - 1, other_init, eq)
        } else {
            eq(node.val.as_scalar(), other_init)
        };
        if !ok {
            return false;
        }
        cur = clamp(node.next.as_deref(), off, shape);
    }
    true
}

/// Merged map of two aligned lists into a list under construction
///
/// A node present on one side only is combined with the other side's
/// default as phantom partner. Leaf results equal to the result default
/// are not inserted; child lists that come out empty are dropped.
pub(crate) fn map_merged_lists<L, R, O, F>(
    left: &RecurseState<'_, L>,
    right: &RecurseState<'_, R>,
    out: &mut List<O>,
    l: &List<L>,
    r: &List<R>,
    rec: usize,
    out_default: &O,
    f: &mut F,
) where
    L: MatrixValue,
    R: MatrixValue,
    O: MatrixValue,
    F: FnMut(&L, &R) -> O,
{
    let loff = left.offset(rec);
    let roff = right.offset(rec);
    let lshape = left.ref_shape(rec);
    let rshape = right.ref_shape(rec);

    let mut lcur = enter(l, loff, lshape);
    let mut rcur = enter(r, roff, rshape);
    let mut tail = &mut out.first;

    while let Some(step) = next_step(lcur, rcur, loff, roff) {
        match step {
            Step::Left(ln) => {
                let key = ln.key - loff;
                if rec > 0 {
                    let mut child = List::new();
                    map_lone(
                        left,
                        &mut child,
                        ln.val.as_sub(),
                        rec - 1,
                        &mut |a| f(a, right.init()),
                        out_default,
                    );
                    if !child.is_empty() {
                        tail = push_tail(tail, key, Value::Sub(child));
                    }
                } else {
                    let v = f(ln.val.as_scalar(), right.init());
                    if v != *out_default {
                        tail = push_tail(tail, key, Value::Scalar(v));
                    }
                }
                lcur = clamp(ln.next.as_deref(), loff, lshape);
            }
            Step::Right(rn) => {
                let key = rn.key - roff;
                if rec > 0 {
                    let mut child = List::new();
                    map_lone(
                        right,
                        &mut child,
                        rn.val.as_sub(),
                        rec - 1,
                        &mut |b| f(left.init(), b),
                        out_default,
                    );
                    if !child.is_empty() {
                        tail = push_tail(tail, key, Value::Sub(child));
                    }
                } else {
                    let v = f(left.init(), rn.val.as_scalar());
                    if v != *out_default {
                        tail = push_tail(tail, key, Value::Scalar(v));
                    }
                }
                rcur = clamp(rn.next.as_deref(), roff, rshape);
            }
            Step::Both(ln, rn) => {
                let key = ln.key - loff;
                if rec > 0 {
                    let mut child = List::new();
                    map_merged_lists(
                        left,
                        right,
                        &mut child,
                        ln.val.as_sub(),
                        rn.val.as_sub(),
                        rec - 1,
                        out_default,
                        f,
                    );
                    if !child.is_empty() {
                        tail = push_tail(tail, key, Value::Sub(child));
                    }
                } else {
                    let v = f(ln.val.as_scalar(), rn.val.as_scalar());
                    if v != *out_default {
                        tail = push_tail(tail, key, Value::Scalar(v));
                    }
                }
                lcur = clamp(ln.next.as_deref(), loff, lshape);
                rcur = clamp(rn.next.as_deref(), roff, rshape);
            }
        }
    }
}

/// Merged-map helper for a subtree present on one side only
fn map_lone<S, O, G>(
    s: &RecurseState<'_, S>,
    out: &mut List<O>,
    l: &List<S>,
    rec: usize,
    g: &mut G,
    out_default: &O,
) where
    S: MatrixValue,
    O: MatrixValue,
    G: FnMut(&S) -> O,
{
    let off = s.offset(rec);
    let shape = s.ref_shape(rec);

    let mut cur = enter(l, off, shape);
    let mut tail = &mut out.first;
    while let Some(node) = cur {
        let key = node.key - off;
        if rec > 0 {
            let mut child = List::new();
            map_lone(s, &mut child, node.val.as_sub(), rec - 1, g, out_default);
            if !child.is_empty() {
                tail = push_tail(tail, key, Value::Sub(child));
            }
        } else {
            let v = g(node.val.as_scalar());
            if v != *out_default {
                tail = push_tail(tail, key, Value::Scalar(v));
            }
        }
        cur = clamp(node.next.as_deref(), off, shape);
    }
}

/// Visit every stored node in reference coordinates
pub(crate) fn each_stored<T, F>(
    s: &RecurseState<'_, T>,
    l: &List<T>,
    rec: usize,
    stack: &mut Vec<usize>,
    f: &mut F,
) where
    T: MatrixValue,
    F: FnMut(&T, &[usize]),
{
    let off = s.offset(rec);
    let shape = s.ref_shape(rec);

    let mut cur = enter(l, off, shape);
    while let Some(node) = cur {
        stack.push(node.key - off);
        if rec > 0 {
            each_stored(s, node.val.as_sub(), rec - 1, stack, f);
        } else {
            f(node.val.as_scalar(), stack);
        }
        stack.pop();
        cur = clamp(node.next.as_deref(), off, shape);
    }
}

/// Visit every index tuple of the reference shape, stored or not
///
/// Absent positions yield the default value.
pub(crate) fn each_dense<T, F>(
    s: &RecurseState<'_, T>,
    l: &List<T>,
    rec: usize,
    stack: &mut Vec<usize>,
    f: &mut F,
) where
    T: MatrixValue,
    F: FnMut(&T, &[usize]),
{
    let off = s.offset(rec);
    let shape = s.ref_shape(rec);

    let mut cur = enter(l, off, shape);
    for index in 0..shape {
        stack.push(index);
        match cur {
            Some(node) if node.key - off == index => {
                if rec > 0 {
                    each_dense(s, node.val.as_sub(), rec - 1, stack, f);
                } else {
                    f(node.val.as_scalar(), stack);
                }
                cur = clamp(node.next.as_deref(), off, shape);
            }
            _ => {
                if rec > 0 {
                    each_absent(s, rec - 1, stack, f);
                } else {
                    f(s.init(), stack);
                }
            }
        }
        stack.pop();
    }
}

/// Dense visit of an entirely absent subtree
fn each_absent<T, F>(s: &RecurseState<'_, T>, rec: usize, stack: &mut Vec<usize>, f: &mut F)
where
    T: MatrixValue,
    F: FnMut(&T, &[usize]),
{
    for index in 0..s.ref_shape(rec) {
        stack.push(index);
        if rec > 0 {
            each_absent(s, rec - 1, stack, f);
        } else {
            f(s.init(), stack);
        }
        stack.pop();
    }
}

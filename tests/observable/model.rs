//! Property tests: a tracked sequence behaves like a `Vec` and fires the
//! documented number of container notifications per operation.

use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;
use vigil_observable::{Value, get_notifier, transform};

#[derive(Clone, Debug)]
enum Op {
    Push(i64),
    Pop,
    Insert(usize, i64),
    Remove(usize),
    SetAt(usize, i64),
    Extend(Vec<i64>),
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<i64>().prop_map(Op::Push),
        Just(Op::Pop),
        (0..8usize, any::<i64>()).prop_map(|(i, v)| Op::Insert(i, v)),
        (0..8usize).prop_map(Op::Remove),
        (0..8usize, any::<i64>()).prop_map(|(i, v)| Op::SetAt(i, v)),
        prop::collection::vec(any::<i64>(), 0..4).prop_map(Op::Extend),
        Just(Op::Clear),
    ]
}

proptest! {
    #[test]
    fn tracked_sequence_matches_vec(ops in prop::collection::vec(op(), 0..40)) {
        let view = transform(&Value::sequence(Vec::<Value>::new()));
        let seq = view.as_tracked().unwrap().clone();
        let fired = Rc::new(Cell::new(0u32));
        let f = Rc::clone(&fired);
        let _sub = get_notifier(&view).unwrap().on_change(move |_| f.set(f.get() + 1));

        let mut model: Vec<i64> = Vec::new();
        let mut expected = 0u32;

        for op in ops {
            match op {
                Op::Push(v) => {
                    seq.push(v).unwrap();
                    model.push(v);
                    expected += 2;
                }
                Op::Pop => {
                    let got = seq.pop().unwrap();
                    let want = model.pop();
                    prop_assert_eq!(got, want.map(Value::Int));
                    if want.is_some() {
                        expected += 1;
                    }
                }
                Op::Insert(i, v) => {
                    let ok = seq.insert(i, v).is_ok();
                    prop_assert_eq!(ok, i <= model.len());
                    if ok {
                        model.insert(i, v);
                        expected += 1;
                    }
                }
                Op::Remove(i) => {
                    let result = seq.remove(i);
                    prop_assert_eq!(result.is_ok(), i < model.len());
                    if let Ok(got) = result {
                        prop_assert_eq!(got, Value::Int(model.remove(i)));
                        expected += 1;
                    }
                }
                Op::SetAt(i, v) => {
                    let result = seq.set_at(i, v);
                    prop_assert_eq!(result.is_ok(), i < model.len());
                    if i < model.len() {
                        if model[i] != v {
                            expected += 1;
                        }
                        model[i] = v;
                    }
                }
                Op::Extend(values) => {
                    if !values.is_empty() {
                        expected += 1;
                    }
                    seq.extend(values.iter().copied()).unwrap();
                    model.extend(values);
                }
                Op::Clear => {
                    if !model.is_empty() {
                        expected += 1;
                    }
                    seq.clear().unwrap();
                    model.clear();
                }
            }
        }

        let values: Vec<Value> = model.into_iter().map(Value::Int).collect();
        prop_assert_eq!(seq.values(), values);
        prop_assert_eq!(fired.get(), expected);
    }
}

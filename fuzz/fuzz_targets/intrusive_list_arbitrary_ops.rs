#![no_main]

use std::collections::VecDeque;

use libfuzzer_sys::fuzz_target;
use stripekit::ds::{IntrusiveList, LinkedNode, SlotArena, SlotId};

// Fuzz arbitrary operation sequences on IntrusiveList
//
// Mirrors every operation on a VecDeque of SlotIds and checks that order,
// membership and structural invariants agree after each step.
fuzz_target!(|data: &[u8]| {
    let mut arena: SlotArena<LinkedNode<u8>> = SlotArena::new();
    let mut list = IntrusiveList::new();
    let mut model: VecDeque<SlotId> = VecDeque::new();
    let mut ids: Vec<SlotId> = Vec::new();

    for pair in data.chunks_exact(2) {
        let op = pair[0] % 9;
        let arg = pair[1];
        let pick = |ids: &[SlotId]| ids.get(arg as usize % ids.len().max(1)).copied();

        match op {
            0 => {
                let id = arena.insert(LinkedNode::new(arg));
                ids.push(id);
                assert!(list.push_front(&mut arena, id));
                model.push_front(id);
            },
            1 => {
                let id = arena.insert(LinkedNode::new(arg));
                ids.push(id);
                assert!(list.offer(&mut arena, id));
                model.push_back(id);
            },
            2 => assert_eq!(list.pop_front(&mut arena), model.pop_front()),
            3 => assert_eq!(list.pop_back(&mut arena), model.pop_back()),
            4 => {
                if let Some(id) = pick(&ids) {
                    let linked = model.contains(&id);
                    assert_eq!(list.remove(&mut arena, id), linked);
                    model.retain(|m| *m != id);
                }
            },
            5 => {
                if let Some(id) = pick(&ids) {
                    let linked = model.contains(&id);
                    assert_eq!(list.move_to_front(&mut arena, id), linked);
                    if linked {
                        model.retain(|m| *m != id);
                        model.push_front(id);
                    }
                }
            },
            6 => {
                if let Some(id) = pick(&ids) {
                    let linked = model.contains(&id);
                    assert_eq!(list.move_to_back(&mut arena, id), linked);
                    if linked {
                        model.retain(|m| *m != id);
                        model.push_back(id);
                    }
                }
            },
            7 => {
                // Re-offering a linked element must be refused.
                if let Some(id) = pick(&ids) {
                    let linked = model.contains(&id);
                    assert_eq!(list.push_back(&mut arena, id), !linked);
                    if !linked {
                        model.push_back(id);
                    }
                }
            },
            _ => {
                list.clear(&mut arena);
                model.clear();
            },
        }

        list.check_invariants(&arena).unwrap();
        assert_eq!(list.is_empty(), model.is_empty());
        assert_eq!(list.peek_front(), model.front().copied());
        assert_eq!(list.peek_back(), model.back().copied());
    }

    let walked: Vec<SlotId> = list.iter(&arena).map(|(id, _)| id).collect();
    assert_eq!(walked, model.iter().copied().collect::<Vec<_>>());
});

//! Priority ordering over a longer registration history
//!
//! Listeners registered in arbitrary order must be invoked lowest priority
//! value first, with ties in registration order, and removing listeners from
//! the middle of a band must not disturb the order of the rest.

use crate::{ChannelTag, ListenerHandle, ListenerOptions, MessagePriority, MessageRouter};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Tick;

type Order = Arc<Mutex<Vec<String>>>;

fn register_named(router: &MessageRouter, order: &Order, name: &str, priority: i32) -> ListenerHandle {
    let order = order.clone();
    let name = name.to_string();
    router.register(
        "Game.Tick",
        ListenerOptions::default().with_priority(priority),
        move |_ctx, _msg: &Tick| order.lock().unwrap().push(name.clone()),
    )
}

fn fire(router: &MessageRouter, order: &Order) -> Vec<String> {
    order.lock().unwrap().clear();
    router.broadcast(&ChannelTag::new("Game.Tick"), &mut Tick);
    order.lock().unwrap().clone()
}

#[test]
fn named_bands_run_in_order() {
    let router = MessageRouter::new();
    let order: Order = Default::default();

    register_named(&router, &order, "monitor", MessagePriority::Monitor.value());
    register_named(&router, &order, "lowest", MessagePriority::Lowest.value());
    register_named(&router, &order, "default", MessagePriority::Default.value());
    register_named(&router, &order, "highest", MessagePriority::Highest.value());
    register_named(&router, &order, "lower", MessagePriority::Lower.value());
    register_named(&router, &order, "higher", MessagePriority::Higher.value());

    assert_eq!(
        fire(&router, &order),
        vec!["highest", "higher", "default", "lower", "lowest", "monitor"]
    );
}

#[test]
fn negative_and_custom_priorities_are_accepted() {
    let router = MessageRouter::new();
    let order: Order = Default::default();

    register_named(&router, &order, "30", 30);
    register_named(&router, &order, "-5", -5);
    register_named(&router, &order, "1000", 1000);

    assert_eq!(fire(&router, &order), vec!["-5", "30", "1000"]);
}

#[test]
fn removal_keeps_remaining_order() {
    let router = MessageRouter::new();
    let order: Order = Default::default();

    let _a = register_named(&router, &order, "a", 50);
    let mut b = register_named(&router, &order, "b", 50);
    let _c = register_named(&router, &order, "c", 10);
    let _d = register_named(&router, &order, "d", 50);
    let mut e = register_named(&router, &order, "e", 0);

    assert_eq!(fire(&router, &order), vec!["e", "c", "a", "b", "d"]);

    router.unregister(&mut b);
    router.unregister(&mut e);
    assert_eq!(fire(&router, &order), vec!["c", "a", "d"]);

    register_named(&router, &order, "f", 50);
    register_named(&router, &order, "g", 10);
    assert_eq!(fire(&router, &order), vec!["c", "g", "a", "d", "f"]);
}

#[test]
fn priority_order_spans_channels_of_one_type() {
    let router = MessageRouter::new();
    let order: Order = Default::default();

    {
        let order = order.clone();
        router.register(
            "Game",
            ListenerOptions::partial().with_priority(MessagePriority::Lowest),
            move |_ctx, _msg: &Tick| order.lock().unwrap().push("game".to_string()),
        );
    }
    register_named(&router, &order, "tick", MessagePriority::Default.value());

    assert_eq!(fire(&router, &order), vec!["tick", "game"]);
}

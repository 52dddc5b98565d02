use std::rc::Rc;

use slotline::Signal;

fn main() {
    let signal = Rc::new(Signal::<u32>::new());

    let _always = signal.connect(|n| println!("always: {n}"));
    signal.connect_once(|n| println!("once: {n}"));

    let weak = Rc::downgrade(&signal);
    signal.connect(move |n| {
        if n == 1 {
            if let Some(signal) = weak.upgrade() {
                println!("re-emitting from inside a slot");
                signal.emit(100);
            }
        }
    });

    {
        let _scoped = signal.scoped(signal.connect(|n| println!("scoped: {n}")));
        signal.emit(1);
    }

    signal.emit(2);
    println!("slots left: {}", signal.slot_count());
}

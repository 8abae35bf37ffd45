use std::collections::HashMap;

use foresight::event::Event;
use foresight::keys_status::KeysStatus;
use input_linux_sys::EV_KEY;
use proptest::prelude::*;

proptest! {
    /// After any sequence of key events, the tracker's value for a code
    /// always matches the value of the last event seen for that code.
    #[test]
    fn tracker_matches_last_observed_value_per_code(
        events in proptest::collection::vec((0u16..32, 0i32..3), 0..200)
    ) {
        let mut status = KeysStatus::new();
        let mut last: HashMap<u16, i32> = HashMap::new();
        for (code, value) in events {
            status.process(&Event::new(EV_KEY as u16, code, value));
            last.insert(code, value);
        }
        for (code, value) in last {
            prop_assert_eq!(status.value(code), value);
        }
    }
}

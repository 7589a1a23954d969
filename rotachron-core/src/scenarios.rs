//! End-to-end scenarios: boot recovery, minute rollover and manual
//! override, with four axis controllers polled round-robin on one thread.

use crate::config::MotionConfig;
use crate::error::ClockError;
use crate::display::{AxisId, Digit, DisplayCoordinator, DisplayOptions, TargetBoard};
use crate::motion::axis::tests::{controller, RecordingStepper};
use crate::motion::{AxisController, AxisEvent};
use crate::time::{plan_recovery, EpochSeconds};
use crate::traits::TimestampStore;

#[derive(Default)]
struct MemoryStore {
    persisted: Option<EpochSeconds>,
    writes: u32,
}

impl MemoryStore {
    fn load_persisted(&self) -> Option<EpochSeconds> {
        self.persisted
    }
}

impl TimestampStore for MemoryStore {
    fn persist(&mut self, timestamp: EpochSeconds) {
        self.persisted = Some(timestamp);
        self.writes += 1;
    }
}

struct Clock {
    board: TargetBoard,
    coordinator: DisplayCoordinator,
    axes: Vec<AxisController<RecordingStepper>>,
    store: MemoryStore,
}

impl Clock {
    fn new(store: MemoryStore) -> Self {
        let motion = MotionConfig::default();
        Self {
            board: TargetBoard::new(),
            coordinator: DisplayCoordinator::new(DisplayOptions::default()),
            axes: AxisId::ALL
                .into_iter()
                .map(|axis| controller(axis, &motion))
                .collect(),
            store,
        }
    }

    /// One round-robin pass over the axes; returns events per axis
    fn quantum(&mut self, events: &mut [Vec<AxisEvent>; 4]) {
        for ctrl in self.axes.iter_mut() {
            if let Some(event) = ctrl.poll(&self.board, 250) {
                events[ctrl.axis().index()].push(event);
            }
        }
    }

    /// Poll until every axis is idle and nothing is pending
    fn settle(&mut self) -> [Vec<AxisEvent>; 4] {
        let mut events: [Vec<AxisEvent>; 4] = Default::default();
        for _ in 0..1_000_000 {
            self.quantum(&mut events);
            let pending = AxisId::ALL.iter().any(|&a| self.board.peek(a).dirty);
            if !pending && self.board.moving_mask() == 0 {
                return events;
            }
        }
        panic!("clock never settled");
    }

    fn shown(&self) -> [Digit; 4] {
        AxisId::ALL.map(|axis| self.axes[axis.index()].digit())
    }

    fn positions(&self) -> [i64; 4] {
        AxisId::ALL.map(|axis| self.axes[axis.index()].position())
    }
}

fn started(events: &[AxisEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, AxisEvent::MoveStarted { .. }))
        .count()
}

fn completed(events: &[AxisEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, AxisEvent::MoveCompleted { .. }))
        .count()
}

fn hm(hour: u32, minute: u32) -> EpochSeconds {
    EpochSeconds(hour * 3600 + minute * 60)
}

#[test]
fn boot_recovery_renders_current_time() {
    let mut clock = Clock::new(MemoryStore {
        persisted: Some(EpochSeconds(1000)),
        writes: 0,
    });
    let now = EpochSeconds(1200);

    let target = plan_recovery(clock.store.load_persisted(), now);
    assert_eq!(target, Some(now));

    let rendered = clock
        .coordinator
        .render(now, &clock.board, &mut clock.store);
    // 1200 s is 00:20, shown as 12:20
    assert_eq!(rendered.values(), [1, 2, 2, 0]);
    assert_eq!(clock.store.persisted, Some(now));
    assert_eq!(clock.store.writes, 1);

    clock.settle();
    assert_eq!(clock.shown(), rendered.digits());
    assert_eq!(clock.positions(), [290, 580, 580, 0]);
}

#[test]
fn boot_without_state_stays_at_rest() {
    let mut clock = Clock::new(MemoryStore::default());
    assert_eq!(plan_recovery(clock.store.load_persisted(), hm(9, 0)), None);

    let events = clock.settle();
    assert!(events.iter().all(Vec::is_empty));
    assert_eq!(clock.positions(), [0; 4]);
    assert_eq!(clock.store.writes, 0);
}

#[test]
fn minute_rollover_moves_each_axis_once() {
    let mut clock = Clock::new(MemoryStore::default());

    clock
        .coordinator
        .render(hm(10, 9), &clock.board, &mut clock.store);
    clock.settle();
    assert_eq!(clock.shown().map(Digit::value), [1, 0, 0, 9]);

    // Seconds within the same minute do nothing
    assert!(clock
        .coordinator
        .tick(EpochSeconds(hm(10, 9).0 + 30), &clock.board, &mut clock.store)
        .is_none());

    let rendered = clock
        .coordinator
        .tick(hm(10, 10), &clock.board, &mut clock.store)
        .expect("rollover renders");
    assert_eq!(rendered.values(), [1, 0, 1, 0]);

    let events = clock.settle();
    for axis in AxisId::ALL {
        let events = &events[axis.index()];
        assert_eq!(started(events), 1, "{:?}", axis);
        assert_eq!(completed(events), 1, "{:?}", axis);
    }
    assert_eq!(clock.shown().map(Digit::value), [1, 0, 1, 0]);
    assert_eq!(clock.store.persisted, Some(hm(10, 10)));
    assert_eq!(clock.store.writes, 2);
}

#[test]
fn override_to_blank_is_independent_of_renders() {
    let mut clock = Clock::new(MemoryStore::default());
    clock
        .coordinator
        .render(hm(3, 45), &clock.board, &mut clock.store);
    clock.settle();

    // Override arrives, then a render for the other axes interleaves with motion
    clock
        .board
        .publish(AxisId::try_from(3).unwrap(), Digit::new(10).unwrap());
    let mut events: [Vec<AxisEvent>; 4] = Default::default();
    clock.quantum(&mut events);
    assert_eq!(clock.board.moving_mask(), 1 << 3);

    for axis in [AxisId::HourTens, AxisId::HourUnits, AxisId::MinuteTens] {
        clock.board.publish(axis, Digit::Seven);
    }
    let rest = clock.settle();

    let minute_units: Vec<_> = events[3].iter().chain(&rest[3]).copied().collect();
    assert_eq!(
        minute_units,
        vec![
            AxisEvent::MoveStarted {
                digit: Digit::Blank,
                from: 5 * 290,
                to: 2900
            },
            AxisEvent::MoveCompleted {
                digit: Digit::Blank,
                position: 2900
            },
        ]
    );
    assert_eq!(clock.shown(), [Digit::Seven, Digit::Seven, Digit::Seven, Digit::Blank]);
}

#[test]
fn rejected_override_leaves_state_untouched() {
    let mut clock = Clock::new(MemoryStore::default());
    clock
        .coordinator
        .render(hm(10, 10), &clock.board, &mut clock.store);
    clock.settle();
    let before = clock.positions();

    assert_eq!(
        clock.board.publish_raw(4, 1),
        Err(ClockError::InvalidAxis(4))
    );
    assert_eq!(
        clock.board.publish_raw(0, 11),
        Err(ClockError::InvalidDigit(11))
    );

    let events = clock.settle();
    assert!(events.iter().all(Vec::is_empty));
    assert_eq!(clock.positions(), before);
}

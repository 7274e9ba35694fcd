//! Laws that hold across the layout and event modules.

use std::cell::RefCell;
use std::rc::Rc;

use blueberry_ui::{
    Align, Event, EventKind, ElementId, ListenerRef, Stage, Table, Value, Widget,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fixed size widget with a separate min size
struct Block {
    min: (f32, f32),
    pref: (f32, f32),
}

impl Widget for Block {
    fn pref_width(&mut self, _: &mut Stage, _: ElementId) -> f32 {
        self.pref.0
    }

    fn pref_height(&mut self, _: &mut Stage, _: ElementId) -> f32 {
        self.pref.1
    }

    fn min_width(&mut self, _: &mut Stage, _: ElementId) -> f32 {
        self.min.0
    }

    fn min_height(&mut self, _: &mut Stage, _: ElementId) -> f32 {
        self.min.1
    }
}

fn block(stage: &mut Stage, width: f32, height: f32) -> ElementId {
    stage.create_widget(Block {
        min: (width, height),
        pref: (width, height),
    })
}

fn table(stage: &mut Stage) -> ElementId {
    let table = stage.create_widget(Table::default());
    stage.add_element(stage.root(), table).unwrap();
    table
}

fn row(stage: &mut Stage, table: ElementId) {
    stage
        .with_widget::<Table, _>(table, |t, _| {
            t.row();
        })
        .unwrap();
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn value_percent_laws() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut stage = Stage::new(100.0, 100.0);
    let element = stage.create_element();

    for _ in 0..50 {
        let width = rng.random_range(0.0f32..1000.0);
        let height = rng.random_range(0.0f32..1000.0);
        stage.set_size(element, width, height).unwrap();

        assert_eq!(Value::percent_width(0.0).get(&mut stage, Some(element)), 0.0);
        assert_eq!(Value::percent_width(1.0).get(&mut stage, Some(element)), width);
        assert_eq!(Value::percent_height(1.0).get(&mut stage, Some(element)), height);

        let p = rng.random_range(0.0f32..=1.0);
        assert_eq!(Value::percent_width(p).get(&mut stage, Some(element)), width * p);
        assert_eq!(Value::percent_height(p).get(&mut stage, Some(element)), height * p);
    }
}

#[test]
fn cell_default_cascade() {
    let mut stage = Stage::new(200.0, 200.0);
    let t = table(&mut stage);

    stage
        .with_widget::<Table, _>(t, |t, _| {
            t.defaults().align(Align::TOP_LEFT);
            // Column default A
            t.column_defaults(0).fill_x().expand_x().pad_top(1.0).unwrap();
        })
        .unwrap();

    // First row: only A applies
    let first = Table::add_to(&mut stage, t, None).unwrap().clone();
    assert_eq!(first.pad_values()[0], Some(Value::Fixed(1.0)));

    // Row default B, overriding A's pad
    stage
        .with_widget::<Table, _>(t, |t, _| {
            t.row().pad_top(7.0).unwrap();
        })
        .unwrap();
    let cell = Table::add_to(&mut stage, t, None).unwrap().clone();

    // B wins where set
    assert_eq!(cell.pad_values()[0], Some(Value::Fixed(7.0)));
    // then A
    assert_eq!(cell.fill_x_value(), Some(1.0));
    assert_eq!(cell.expand_x_value(), Some(1));
    // then the table's cell defaults
    assert_eq!(cell.align_value(), Some(Align::TOP_LEFT));
    // then the global defaults
    assert_eq!(cell.colspan_value(), Some(1));
    assert_eq!(cell.min_width_value(), Some(Value::MinWidth));
    assert_eq!(cell.pad_values()[1], Some(Value::ZERO));
    assert_eq!(cell.uniform_x_value(), None);

    // A second column has no column defaults
    let other = Table::add_to(&mut stage, t, None).unwrap().clone();
    assert_eq!(other.column(), 1);
    assert_eq!(other.fill_x_value(), Some(0.0));
    assert_eq!(other.pad_values()[0], Some(Value::Fixed(7.0)));
}

#[test]
fn table_min_never_exceeds_pref() {
    let mut rng = StdRng::seed_from_u64(0xB1E5);
    for _ in 0..200 {
        let mut stage = Stage::new(500.0, 500.0);
        let t = table(&mut stage);
        if rng.random_bool(0.3) {
            let pad = rng.random_range(0.0f32..6.0);
            stage
                .with_widget::<Table, _>(t, |t, _| {
                    t.pad(pad).unwrap();
                })
                .unwrap();
        }

        let cells = rng.random_range(1..12);
        for _ in 0..cells {
            let min = (rng.random_range(0.0f32..40.0), rng.random_range(0.0f32..40.0));
            let pref = (
                min.0 + rng.random_range(0.0f32..40.0),
                min.1 + rng.random_range(0.0f32..40.0),
            );
            let element = stage.create_widget(Block { min, pref });

            let colspan = rng.random_range(1usize..4);
            let space = rng.random_range(0.0f32..8.0);
            let pad = rng.random_range(0.0f32..5.0);
            let (spaced, padded) = (rng.random_bool(0.3), rng.random_bool(0.3));
            let (expand, uniform, ignore) =
                (rng.random_bool(0.2), rng.random_bool(0.2), rng.random_bool(0.1));

            let cell = Table::add_to(&mut stage, t, Some(element)).unwrap();
            cell.colspan(colspan).unwrap();
            if spaced {
                cell.space(space).unwrap();
            }
            if padded {
                cell.pad(pad).unwrap();
            }
            if expand {
                cell.expand();
            }
            if uniform {
                cell.uniform();
            }
            if ignore {
                cell.ignore();
            }
            if rng.random_bool(0.25) {
                row(&mut stage, t);
            }
        }

        let (min_width, pref_width, min_height, pref_height) = stage
            .with_widget::<Table, _>(t, |t, stage| {
                (
                    t.table_min_width(stage),
                    t.table_pref_width(stage),
                    t.table_min_height(stage),
                    t.table_pref_height(stage),
                )
            })
            .unwrap();
        assert!(min_width <= pref_width, "{min_width} > {pref_width}");
        assert!(min_height <= pref_height, "{min_height} > {pref_height}");
    }
}

#[test]
fn expanded_layout_uses_all_width() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..100 {
        let mut stage = Stage::new(1000.0, 1000.0);
        let t = table(&mut stage);
        let (pad_left, pad_right) = (rng.random_range(0.0f32..10.0), rng.random_range(0.0f32..10.0));
        stage
            .with_widget::<Table, _>(t, |t, _| {
                t.pad_left(pad_left).unwrap().pad_right(pad_right).unwrap();
            })
            .unwrap();

        let columns = rng.random_range(1..6);
        let expanding = rng.random_range(0..columns);
        for column in 0..columns {
            let width = rng.random_range(1.0f32..60.0);
            let element = block(&mut stage, width, 10.0);
            let cell = Table::add_to(&mut stage, t, Some(element)).unwrap();
            if column == expanding || rng.random_bool(0.3) {
                cell.expand_xy(rng.random_range(1..4), 0);
            }
            if rng.random_bool(0.5) {
                cell.space_right(rng.random_range(0.0f32..5.0)).unwrap();
            }
        }

        let min_width = stage
            .with_widget::<Table, _>(t, |t, stage| t.table_min_width(stage))
            .unwrap();
        let width = min_width + rng.random_range(1.0f32..400.0);
        stage.set_size(t, width, 50.0).unwrap();
        stage.validate(t).unwrap();

        let t_ref = stage.widget::<Table>(t).unwrap();
        let columns_width: f32 = (0..t_ref.columns()).map(|c| t_ref.column_width(c)).sum();
        assert!(
            approx(columns_width + pad_left + pad_right, width),
            "{columns_width} + {pad_left} + {pad_right} != {width}"
        );
    }
}

#[test]
fn stop_in_capture_short_circuits() {
    let mut stage = Stage::new(100.0, 100.0);
    let top = stage.create_group();
    let mid = stage.create_group();
    let target = stage.create_element();
    stage.add_element(stage.root(), top).unwrap();
    stage.add_element(top, mid).unwrap();
    stage.add_element(mid, target).unwrap();

    let log = Rc::new(RefCell::new(Vec::new()));
    let recorder = |name: &'static str, stop: bool| {
        let log = log.clone();
        ListenerRef::new(move |_: &mut Stage, event: &mut Event| {
            log.borrow_mut().push(name);
            if stop {
                event.stop();
            }
            false
        })
    };

    stage.add_capture_listener(top, recorder("top capture", false)).unwrap();
    stage.add_listener(top, recorder("top", false)).unwrap();
    stage.add_capture_listener(mid, recorder("mid capture", true)).unwrap();
    stage.add_listener(mid, recorder("mid", false)).unwrap();
    stage.add_capture_listener(target, recorder("target capture", false)).unwrap();
    stage.add_listener(target, recorder("target", false)).unwrap();

    let mut event = Event::new(EventKind::Custom("ping"));
    let cancelled = stage.fire(target, &mut event).unwrap();

    assert!(!cancelled);
    assert!(event.is_stopped());
    assert_eq!(*log.borrow(), ["top capture", "mid capture"]);
}

#[test]
fn listener_removing_itself_during_dispatch() {
    let mut stage = Stage::new(100.0, 100.0);
    let target = stage.create_element();
    stage.add_element(stage.root(), target).unwrap();

    let log = Rc::new(RefCell::new(Vec::new()));
    let self_slot: Rc<RefCell<Option<ListenerRef>>> = Rc::default();

    let first = {
        let log = log.clone();
        ListenerRef::new(move |_: &mut Stage, _: &mut Event| {
            log.borrow_mut().push(1);
            false
        })
    };
    let removing = {
        let log = log.clone();
        let slot = self_slot.clone();
        ListenerRef::new(move |stage: &mut Stage, event: &mut Event| {
            log.borrow_mut().push(2);
            let me = slot.borrow().clone();
            if let (Some(me), Some(id)) = (me, event.listener_element()) {
                assert!(stage.remove_listener(id, &me).unwrap());
            }
            false
        })
    };
    let last = {
        let log = log.clone();
        ListenerRef::new(move |_: &mut Stage, _: &mut Event| {
            log.borrow_mut().push(3);
            false
        })
    };
    *self_slot.borrow_mut() = Some(removing.clone());

    stage.add_listener(target, first).unwrap();
    stage.add_listener(target, removing.clone()).unwrap();
    stage.add_listener(target, last).unwrap();

    stage
        .fire(target, &mut Event::new(EventKind::Custom("one")))
        .unwrap();
    assert_eq!(*log.borrow(), [1, 2, 3]);
    assert_eq!(stage.listeners(target).len(), 2);
    assert!(!stage.listeners(target).contains(&removing));

    stage
        .fire(target, &mut Event::new(EventKind::Custom("two")))
        .unwrap();
    assert_eq!(*log.borrow(), [1, 2, 3, 1, 3]);
}

#[test]
fn two_column_table_with_spanning_row() {
    let mut stage = Stage::new(400.0, 400.0);
    let t = table(&mut stage);

    let a = block(&mut stage, 50.0, 20.0);
    let b = block(&mut stage, 30.0, 20.0);
    let wide = block(&mut stage, 100.0, 15.0);
    let small = block(&mut stage, 20.0, 10.0);

    Table::add_to(&mut stage, t, Some(a)).unwrap();
    Table::add_to(&mut stage, t, Some(b)).unwrap().colspan(1).unwrap();
    row(&mut stage, t);
    Table::add_to(&mut stage, t, Some(wide)).unwrap().colspan(2).unwrap();
    row(&mut stage, t);
    Table::add_to(&mut stage, t, Some(small)).unwrap();

    assert_eq!(stage.pref_width(t), 100.0);
    assert_eq!(stage.pref_height(t), 45.0);

    // Before the spanning row the columns would be 50 and 30; its extra 20 is split evenly
    {
        let t_ref = stage.widget::<Table>(t).unwrap();
        assert_eq!((t_ref.columns(), t_ref.rows()), (2, 3));
        assert_eq!(t_ref.column_pref_width(0), 60.0);
        assert_eq!(t_ref.column_pref_width(1), 40.0);
    }

    stage.pack(t).unwrap();
    let t_ref = stage.widget::<Table>(t).unwrap();
    assert_eq!(t_ref.column_width(0), 60.0);
    assert_eq!(t_ref.column_width(1), 40.0);
    assert_eq!(t_ref.row_height(1), 15.0);

    // Centered in their cells
    assert_eq!(stage.element(a).unwrap().x(), 5.0);
    assert_eq!(stage.element(b).unwrap().x(), 65.0);
    assert_eq!(stage.element(wide).unwrap().y(), 20.0);
    assert_eq!(stage.element(small).unwrap().y(), 35.0);
}

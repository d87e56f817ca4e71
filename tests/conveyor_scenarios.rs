use std::sync::Arc;
use std::time::Duration;

use folio::conveyor::{
    ContentSupply, Conveyor, ConveyorOptions, ConveyorTurn, EntryPoint, HeadlessSurfaceFactory,
    InMemorySupply, Phase, ShiftOutcome, WindowDefaults,
};
use folio::pagination::{ChapterJump, ConstructionState, Direction};
use folio::{EventBus, ManualClock, ReaderEventKind};

// 320x480 at 16px holds 800 characters per page
const PAGE_CHARS: usize = 800;
const WAIT: Duration = Duration::from_secs(2);

fn book(windows: usize, pages_per_chapter: usize) -> Arc<dyn ContentSupply> {
    let chapters = (0..windows)
        .map(|_| format!("<p>{}</p>", "x".repeat(pages_per_chapter * PAGE_CHARS)))
        .collect();
    Arc::new(InMemorySupply::new(chapters, 1))
}

fn factory() -> HeadlessSurfaceFactory {
    HeadlessSurfaceFactory {
        viewport_width: 320.0,
        viewport_height: 480.0,
    }
}

fn start_with(
    supply: Arc<dyn ContentSupply>,
    events: EventBus,
    options: ConveyorOptions,
) -> Conveyor<HeadlessSurfaceFactory> {
    Conveyor::start(
        supply,
        factory(),
        Arc::new(ManualClock::new()),
        events,
        options,
    )
    .unwrap()
}

fn start(windows: usize, initial_window: usize) -> Conveyor<HeadlessSurfaceFactory> {
    start_with(
        book(windows, 2),
        EventBus::new(),
        ConveyorOptions {
            initial_window,
            defaults: WindowDefaults {
                diagnostics: true,
                ..WindowDefaults::default()
            },
            ..ConveyorOptions::default()
        },
    )
}

#[test]
fn startup_builds_five_ready_windows() {
    let conveyor = start(10, 0);

    assert_eq!(conveyor.ring_indices(), vec![0, 1, 2, 3, 4]);
    assert_eq!(conveyor.phase(), Phase::Startup);
    assert_eq!(conveyor.active_index(), 0);
    for index in 0..5 {
        let window = conveyor.window(index).unwrap();
        assert!(window.is_ready(), "window {index} not preloaded");
        assert_eq!(window.construction_state(), ConstructionState::Active);
    }
}

#[test]
fn startup_near_the_end_keeps_a_full_ring() {
    let conveyor = start(7, 5);
    assert_eq!(conveyor.ring_indices(), vec![2, 3, 4, 5, 6]);
    assert_eq!(conveyor.active_index(), 5);
}

#[test]
fn short_book_holds_every_window() {
    let conveyor = start(3, 1);
    assert_eq!(conveyor.ring_indices(), vec![0, 1, 2]);
}

#[test]
fn empty_book_and_bad_initial_window_are_rejected() {
    let empty: Arc<dyn ContentSupply> = Arc::new(InMemorySupply::new(Vec::new(), 1));
    assert!(
        Conveyor::start(
            empty,
            factory(),
            Arc::new(ManualClock::new()),
            EventBus::new(),
            ConveyorOptions::default(),
        )
        .is_err()
    );

    let result = Conveyor::start(
        book(3, 1),
        factory(),
        Arc::new(ManualClock::new()),
        EventBus::new(),
        ConveyorOptions {
            initial_window: 3,
            ..ConveyorOptions::default()
        },
    );
    assert!(result.is_err());
}

#[test]
fn entering_the_center_window_switches_to_steady_once() {
    let mut conveyor = start(10, 0);

    assert!(!conveyor.enter_window(0).unwrap());
    assert!(!conveyor.enter_window(1).unwrap());
    assert_eq!(conveyor.phase(), Phase::Startup);
    assert_eq!(conveyor.handle_boundary(Direction::Next, 1), ShiftOutcome::Ignored);

    assert!(conveyor.enter_window(2).unwrap());
    assert_eq!(conveyor.phase(), Phase::Steady);

    assert!(!conveyor.enter_window(2).unwrap());
    assert!(!conveyor.enter_window(3).unwrap());
    assert_eq!(conveyor.phase(), Phase::Steady);
    assert_eq!(conveyor.ring_indices(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn forward_shift_evicts_the_head_and_preloads_the_new_tail() {
    let mut conveyor = start(10, 0);
    conveyor.enter_window(2).unwrap();
    conveyor.enter_window(3).unwrap();

    assert_eq!(
        conveyor.handle_boundary(Direction::Next, 3),
        ShiftOutcome::Requested { window_index: 5 }
    );
    assert_eq!(conveyor.handle_boundary(Direction::Next, 3), ShiftOutcome::Coalesced);
    assert_eq!(conveyor.wait_for_construction(WAIT), vec![5]);
    assert_eq!(conveyor.ring_indices(), vec![1, 2, 3, 4, 5]);

    assert_eq!(
        conveyor.handle_boundary(Direction::Next, 5),
        ShiftOutcome::Requested { window_index: 6 }
    );
    assert_eq!(conveyor.wait_for_construction(WAIT), vec![6]);

    assert_eq!(conveyor.ring_indices(), vec![2, 3, 4, 5, 6]);
    assert!(conveyor.window(1).is_none());
    let tail = conveyor.window(6).unwrap();
    assert!(tail.is_ready());
    assert_eq!(tail.construction_state(), ConstructionState::Active);
    assert!(conveyor.validate_ring());
}

#[test]
fn backward_shift_evicts_the_tail() {
    let mut conveyor = start(10, 5);
    assert_eq!(conveyor.ring_indices(), vec![5, 6, 7, 8, 9]);
    conveyor.enter_window(7).unwrap();
    conveyor.enter_window(6).unwrap();

    assert_eq!(
        conveyor.handle_boundary(Direction::Previous, 6),
        ShiftOutcome::Requested { window_index: 4 }
    );
    assert_eq!(conveyor.wait_for_construction(WAIT), vec![4]);
    assert_eq!(conveyor.ring_indices(), vec![4, 5, 6, 7, 8]);
    assert!(conveyor.window(9).is_none());
}

#[test]
fn shifts_stop_at_the_book_edges() {
    let mut conveyor = start(5, 0);
    conveyor.enter_window(2).unwrap();

    assert_eq!(
        conveyor.handle_boundary(Direction::Next, 4),
        ShiftOutcome::AtBookBoundary
    );
    assert_eq!(
        conveyor.handle_boundary(Direction::Previous, 1),
        ShiftOutcome::AtBookBoundary
    );
    assert_eq!(conveyor.in_flight(), 0);
}

#[test]
fn boundary_far_from_the_ring_edge_needs_no_shift() {
    let mut conveyor = start(10, 0);
    conveyor.enter_window(2).unwrap();
    assert_eq!(conveyor.handle_boundary(Direction::Next, 2), ShiftOutcome::NotNeeded);
    assert_eq!(conveyor.ring_indices(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn page_turns_cross_into_adjacent_windows() {
    let mut conveyor = start(10, 0);

    assert_eq!(
        conveyor.next_page(),
        ConveyorTurn::Page {
            window_index: 0,
            page: 1
        }
    );
    assert_eq!(
        conveyor.next_page(),
        ConveyorTurn::EnteredWindow {
            window_index: 1,
            page: 0
        }
    );
    assert_eq!(
        conveyor.prev_page(),
        ConveyorTurn::EnteredWindow {
            window_index: 0,
            page: 1
        }
    );
    conveyor.prev_page();
    assert_eq!(conveyor.prev_page(), ConveyorTurn::StartOfBook);
}

#[test]
fn reading_forward_slides_the_ring() {
    let mut conveyor = start(10, 0);

    // Two pages per window: nine turns end on the last page of window 4
    for _ in 0..9 {
        conveyor.next_page();
        conveyor.tick();
        conveyor.wait_for_construction(WAIT);
    }

    assert_eq!(conveyor.phase(), Phase::Steady);
    assert_eq!(conveyor.active_index(), 4);
    assert_eq!(conveyor.ring_indices(), vec![2, 3, 4, 5, 6]);
    assert!(conveyor.validate_ring());
}

#[test]
fn reading_to_the_end_reports_end_of_book() {
    let mut conveyor = start(6, 0);
    let mut last = None;
    for _ in 0..20 {
        let turn = conveyor.next_page();
        conveyor.tick();
        conveyor.wait_for_construction(WAIT);
        if turn == ConveyorTurn::EndOfBook {
            last = Some(turn);
            break;
        }
    }
    assert_eq!(last, Some(ConveyorTurn::EndOfBook));
    assert_eq!(conveyor.active_index(), 5);
    assert_eq!(conveyor.ring_indices(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn far_jump_abandons_in_flight_construction() {
    let mut conveyor = start(20, 0);
    conveyor.enter_window(2).unwrap();
    conveyor.enter_window(3).unwrap();
    assert!(matches!(
        conveyor.handle_boundary(Direction::Next, 3),
        ShiftOutcome::Requested { .. }
    ));

    conveyor.jump_to_window(12).unwrap();
    assert_eq!(conveyor.in_flight(), 0);
    assert_eq!(conveyor.ring_indices(), vec![10, 11, 12, 13, 14]);
    assert_eq!(conveyor.active_index(), 12);

    std::thread::sleep(Duration::from_millis(100));
    assert!(conveyor.poll().is_empty());
    assert_eq!(conveyor.ring_indices(), vec![10, 11, 12, 13, 14]);
}

#[test]
fn entering_a_window_outside_the_ring_rebuilds_around_it() {
    let mut conveyor = start(20, 0);
    conveyor.enter_window(9).unwrap();
    assert_eq!(conveyor.ring_indices(), vec![7, 8, 9, 10, 11]);
    assert_eq!(conveyor.active_index(), 9);
    assert!(conveyor.validate_ring());
    assert!(!conveyor.heal().unwrap());
}

#[test]
fn chapter_jumps_route_to_the_owning_window() {
    let events = EventBus::new();
    let rx = events.subscribe();
    let mut conveyor = start_with(book(20, 2), events, ConveyorOptions::default());

    assert_eq!(
        conveyor.jump_to_chapter(15, false).unwrap(),
        ChapterJump::Landed(0)
    );
    assert_eq!(conveyor.active_index(), 15);
    assert_eq!(conveyor.ring_indices(), vec![13, 14, 15, 16, 17]);

    assert_eq!(
        conveyor.jump_to_chapter(99, false).unwrap(),
        ChapterJump::NotLoaded
    );
    assert!(rx.try_iter().any(|e| e.kind
        == ReaderEventKind::ChapterNotLoaded { chapter_index: 99 }));
}

#[test]
fn entry_point_positions_the_first_window() {
    let supply: Arc<dyn ContentSupply> = Arc::new(InMemorySupply::new(
        (0..12)
            .map(|_| format!("<p>{}</p>", "y".repeat(3 * PAGE_CHARS)))
            .collect(),
        2,
    ));
    let mut conveyor = start_with(
        supply,
        EventBus::new(),
        ConveyorOptions {
            initial_window: 1,
            entry: Some(EntryPoint {
                entry_chapter_index: 3,
                entry_page_index: 1,
            }),
            ..ConveyorOptions::default()
        },
    );

    let session = conveyor.active_window_mut().unwrap().session_mut();
    assert_eq!(session.current_page(), 4);
    assert_eq!(session.current_chapter(), Some(3));
}

#[test]
fn snapshot_carries_the_conveyor_phase() {
    let mut conveyor = start(10, 0);
    assert_eq!(conveyor.snapshot().unwrap().phase, Some(Phase::Startup));
    conveyor.enter_window(2).unwrap();
    let snapshot = conveyor.snapshot().unwrap();
    assert_eq!(snapshot.phase, Some(Phase::Steady));
    assert_eq!(snapshot.loaded_segments, vec![2]);
}

#[test]
fn position_survives_a_font_change() {
    let mut conveyor = start_with(book(6, 8), EventBus::new(), ConveyorOptions::default());
    conveyor
        .active_window_mut()
        .unwrap()
        .session_mut()
        .go_to_page(5, false);

    let position = conveyor.current_position().unwrap();
    assert_eq!(position.window_index, 0);
    assert_eq!(position.page_index, 5);
    assert_eq!(position.char_offset, Some(5 * PAGE_CHARS));

    // Twice the font: 20 characters per line, 10 lines per page
    conveyor.set_font_size(32.0).unwrap();
    let session = conveyor.active_window_mut().unwrap().session_mut();
    assert_eq!(session.page_count(), 32);
    assert_eq!(session.tracked_page(), 20);

    session.go_to_page(0, false);
    assert_eq!(conveyor.restore_position(&position).unwrap(), 20);
}

#[test]
fn restore_falls_back_to_page_index_and_jumps_windows() {
    let mut conveyor = start(20, 0);
    let position = folio::ReadingPosition::new(11, Some(11), 1, None);

    assert_eq!(conveyor.restore_position(&position).unwrap(), 1);
    assert_eq!(conveyor.active_index(), 11);
    assert!(conveyor.ring_indices().contains(&11));
}

#[test]
fn reading_backward_from_a_mid_book_start_rebuilds_the_ring() {
    let mut conveyor = start(10, 5);
    assert_eq!(conveyor.ring_indices(), vec![5, 6, 7, 8, 9]);

    assert_eq!(
        conveyor.prev_page(),
        ConveyorTurn::EnteredWindow {
            window_index: 4,
            page: 1
        }
    );
    assert_eq!(conveyor.phase(), Phase::Steady);
    assert_eq!(conveyor.ring_indices(), vec![2, 3, 4, 5, 6]);

    let mut last = None;
    for _ in 0..40 {
        let turn = conveyor.prev_page();
        conveyor.tick();
        conveyor.wait_for_construction(WAIT);
        if turn == ConveyorTurn::StartOfBook {
            last = Some(turn);
            break;
        }
    }
    assert_eq!(last, Some(ConveyorTurn::StartOfBook));
    assert_eq!(conveyor.active_index(), 0);
    assert_eq!(conveyor.ring_indices(), vec![0, 1, 2, 3, 4]);
    assert!(conveyor.validate_ring());
}

#[test]
fn oversized_windows_keep_every_chapter_reachable() {
    let supply: Arc<dyn ContentSupply> = Arc::new(InMemorySupply::new(
        (0..8)
            .map(|_| format!("<p>{}</p>", "z".repeat(PAGE_CHARS)))
            .collect(),
        8,
    ));
    let mut conveyor = start_with(supply, EventBus::new(), ConveyorOptions::default());
    assert_eq!(conveyor.ring_indices(), vec![0, 1]);

    let first = conveyor.window(0).unwrap();
    assert_eq!(
        (first.first_chapter_index, first.last_chapter_index),
        (0, 4)
    );
    assert!(!first.holds_chapter(5));

    assert_eq!(
        conveyor.jump_to_chapter(0, false).unwrap(),
        ChapterJump::Landed(0)
    );
    assert_eq!(
        conveyor.jump_to_chapter(7, false).unwrap(),
        ChapterJump::Landed(2)
    );
    assert_eq!(conveyor.active_index(), 1);
}

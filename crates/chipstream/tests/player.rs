use rand::SeedableRng;
use rand::rngs::StdRng;
use std::cell::RefCell;
use std::rc::Rc;

use chipstream::chip::{ChipSink, ChipWrite};
use chipstream::library::{MemoryLibrary, TrackLibrary};
use chipstream::meta::Gd3;
use chipstream::player::{Player, PlayerConfig, PlayerError};
use chipstream::selector::{PlayMode, Strategy};
use chipstream::vgm::VgmBuilder;

#[derive(Debug, Default)]
struct Recorder {
    writes: Vec<ChipWrite>,
    clocks: Vec<u32>,
    resets: usize,
}

impl ChipSink for Recorder {
    fn write(&mut self, address: u8, data: u8) {
        self.writes.push(ChipWrite { address, data });
    }

    fn reset(&mut self) {
        self.resets += 1;
    }

    fn set_clock(&mut self, hz: u32) {
        self.clocks.push(hz);
    }
}

fn track(title: &str, marker: u8) -> Vec<u8> {
    let mut b = VgmBuilder::new();
    b.set_ym2151_clock(3_579_545 + u32::from(marker));
    b.set_gd3(Gd3 {
        track_name: title.into(),
        ..Gd3::default()
    });
    b.ym2151_write(0x01, marker).wait_short(2);
    b.finalize()
}

fn corrupt(title: &str) -> Vec<u8> {
    let mut bytes = track(title, 0xFF);
    bytes[0..4].copy_from_slice(b"XGM ");
    bytes
}

fn library(n: usize) -> MemoryLibrary {
    (0..n)
        .map(|i| (format!("track{i}.vgm"), track(&format!("Track {i}"), i as u8)))
        .collect()
}

fn config(mode: PlayMode, max_loops: u32) -> PlayerConfig {
    PlayerConfig {
        buffer_capacity: 64,
        loop_cache_len: 16,
        max_loops,
        play_mode: mode,
        ..PlayerConfig::default()
    }
}

fn player(lib: MemoryLibrary, cfg: PlayerConfig) -> Player<MemoryLibrary, Recorder> {
    Player::with_rng(lib, Recorder::default(), cfg, StdRng::seed_from_u64(42))
        .expect("library has playable tracks")
}

/// Poll `times` times, letting the tick drain every wait in between.
fn run(p: &mut Player<MemoryLibrary, Recorder>, times: usize) {
    let tick = p.tick_state();
    for _ in 0..times {
        p.poll().unwrap();
        while tick.tick() {}
    }
}

#[test]
fn test_first_track_is_prepared_on_start() {
    let p = player(library(3), config(PlayMode::Loop, 3));
    assert_eq!(p.current_index(), 0);
    assert_eq!(p.current_name(), Some("track0.vgm"));
    assert_eq!(p.current_metadata().unwrap().track_name, "Track 0");
    assert!(p.is_ready());
    assert_eq!(p.sink().clocks, vec![3_579_545]);
    assert_eq!(p.sink().resets, 1);
}

#[test]
fn test_empty_library_has_no_tracks() {
    let err = Player::with_rng(
        MemoryLibrary::new(),
        Recorder::default(),
        PlayerConfig::default(),
        StdRng::seed_from_u64(1),
    )
    .err()
    .unwrap();
    assert!(matches!(err, PlayerError::NoTracks));
}

#[test]
fn test_corrupt_tracks_are_skipped() {
    let lib: MemoryLibrary = [
        ("bad0.vgm", corrupt("Bad")),
        ("bad1.vgm", vec![0u8; 8]),
        ("good.vgm", track("Good", 7)),
    ]
    .into_iter()
    .collect();
    let p = player(lib, config(PlayMode::Loop, 3));
    assert_eq!(p.current_index(), 2);
    assert_eq!(p.current_metadata().unwrap().track_name, "Good");
    assert_eq!(p.sink().resets, 1);
}

#[test]
fn test_all_corrupt_library_gives_up_after_one_pass() {
    let lib: MemoryLibrary = (0..4)
        .map(|i| (format!("bad{i}.vgm"), corrupt("Bad")))
        .collect();
    let err = Player::with_rng(
        lib,
        Recorder::default(),
        PlayerConfig::default(),
        StdRng::seed_from_u64(1),
    )
    .err()
    .unwrap();
    assert!(matches!(err, PlayerError::NoPlayableTrack { attempts: 4 }));
}

#[test]
fn test_request_selects_by_trimmed_name() {
    let mut p = player(library(5), config(PlayMode::Loop, 3));
    assert_eq!(
        p.select_track(Strategy::Request("  track2.vgm\n".into())).unwrap(),
        2
    );
    assert_eq!(p.current_index(), 2);
    assert_eq!(p.current_metadata().unwrap().track_name, "Track 2");
    assert_eq!(p.library().len(), 5);
}

#[test]
fn test_request_miss_keeps_current_track() {
    let mut p = player(library(3), config(PlayMode::Loop, 3));
    p.select_track(Strategy::Next).unwrap();
    run(&mut p, 1);

    let err = p
        .select_track(Strategy::Request("nope.vgm".into()))
        .unwrap_err();
    assert!(matches!(err, PlayerError::NotFound(ref name) if name == "nope.vgm"));
    assert_eq!(p.current_index(), 1);
    assert!(p.is_ready());
    assert_eq!(p.current_metadata().unwrap().track_name, "Track 1");

    // playback resumes where it stopped
    run(&mut p, 1);
    assert_eq!(p.sink().writes.last(), Some(&ChipWrite { address: 0x01, data: 1 }));
}

#[test]
fn test_track_switch_resets_loop_count() {
    let mut p = player(library(2), config(PlayMode::Loop, 3));
    run(&mut p, 7);
    assert!(p.loop_count() > 0);
    p.select_track(Strategy::Previous).unwrap();
    assert_eq!(p.current_index(), 1);
    assert_eq!(p.loop_count(), 0);
    assert_eq!(p.tick_state().wait_samples(), 0);
}

#[test]
fn test_in_order_advances_after_max_loops() {
    let mut p = player(library(3), config(PlayMode::InOrder, 2));
    // each loop is three commands: write, wait, end marker
    run(&mut p, 5);
    assert_eq!(p.current_index(), 0);
    assert_eq!(p.loop_count(), 1);
    run(&mut p, 1);
    assert_eq!(p.current_index(), 1);
    assert_eq!(p.loop_count(), 0);
    assert_eq!(p.current_metadata().unwrap().track_name, "Track 1");
}

#[test]
fn test_loop_mode_never_advances() {
    let mut p = player(library(3), config(PlayMode::Loop, 1));
    run(&mut p, 60);
    assert_eq!(p.current_index(), 0);
    assert_eq!(p.loop_count(), 20);
}

#[test]
fn test_shuffle_moves_to_another_track() {
    let mut p = player(library(2), config(PlayMode::Shuffle, 1));
    run(&mut p, 3);
    assert_eq!(p.current_index(), 1);
    run(&mut p, 3);
    assert_eq!(p.current_index(), 0);
}

#[test]
fn test_play_mode_can_change_while_playing() {
    let mut p = player(library(3), config(PlayMode::Loop, 1));
    run(&mut p, 6);
    assert_eq!(p.current_index(), 0);
    p.set_play_mode(PlayMode::InOrder);
    assert_eq!(p.play_mode(), PlayMode::InOrder);
    run(&mut p, 3);
    assert_eq!(p.current_index(), 1);
}

#[test]
fn test_truncated_track_advances_to_next() {
    let mut cut = track("Cut", 9);
    cut.truncate(0x102);
    let lib: MemoryLibrary = [("cut.vgm", cut), ("next.vgm", track("Next", 1))]
        .into_iter()
        .collect();
    let mut p = player(lib, config(PlayMode::Loop, 3));
    assert_eq!(p.current_index(), 0);
    run(&mut p, 1);
    assert_eq!(p.current_index(), 1);
    assert!(p.sink().writes.is_empty());
}

#[test]
fn test_track_cut_after_wait_advances_to_next() {
    // 54 01 09, 71, with the 66 end marker cut off
    let mut cut = track("Cut", 9);
    cut.truncate(0x104);
    let lib: MemoryLibrary = [("cut.vgm", cut), ("next.vgm", track("Next", 1))]
        .into_iter()
        .collect();
    let mut p = player(lib, config(PlayMode::Loop, 3));
    run(&mut p, 10);
    assert_eq!(p.current_index(), 1);
    assert_eq!(
        p.sink().writes.first(),
        Some(&ChipWrite {
            address: 0x01,
            data: 9
        })
    );
}

#[test]
fn test_unknown_opcode_reaches_hook() {
    let mut b = VgmBuilder::new();
    b.raw(&[0x01]).wait_short(1);
    let lib: MemoryLibrary = [("odd.vgm", b.finalize())].into_iter().collect();
    let mut p = player(lib, config(PlayMode::Loop, 3));

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    p.on_command_error(move |err| sink.borrow_mut().push(err.opcode));

    run(&mut p, 3);
    assert_eq!(*seen.borrow(), vec![0x01]);
    assert_eq!(p.session().unwrap().command_error_count(), 1);
    assert_eq!(p.current_index(), 0);
}

#[test]
fn test_default_config() {
    let cfg = PlayerConfig::default();
    assert_eq!(cfg.buffer_capacity, 8192);
    assert_eq!(cfg.loop_cache_len, 512);
    assert_eq!(cfg.max_loops, 3);
    assert_eq!(cfg.play_mode, PlayMode::Shuffle);
    assert_eq!(cfg.sample_rate, 44_100);
}

//! `info` subcommand: header and Gd3 summary table.
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chipstream::timing::DEFAULT_SAMPLE_RATE;
use chipstream::{Gd3, MemorySource, TickState, TrackSession, VgmHeader};
use comfy_table::{Cell, ContentArrangement, Table, presets::NOTHING};

fn seconds(samples: u32) -> String {
    let secs = f64::from(samples) / f64::from(DEFAULT_SAMPLE_RATE);
    format!("{samples} ({secs:.3} s)")
}

fn chip_clocks(header: &VgmHeader) -> Vec<(&'static str, u32)> {
    [
        ("sn76489", header.sn76489_clock),
        ("ym2413", header.ym2413_clock),
        ("ym2612", header.ym2612_clock),
        ("ym2151", header.ym2151_clock),
        ("sega_pcm", header.sega_pcm_clock),
        ("rf5c68", header.rf5c68_clock),
        ("ym2203", header.ym2203_clock),
        ("ym2608", header.ym2608_clock),
        ("ym2610", header.ym2610_clock),
        ("ym3812", header.ym3812_clock),
        ("ym3526", header.ym3526_clock),
        ("y8950", header.y8950_clock),
        ("ymf262", header.ymf262_clock),
        ("ymf278b", header.ymf278b_clock),
        ("ymf271", header.ymf271_clock),
        ("ymz280b", header.ymz280b_clock),
        ("rf5c164", header.rf5c164_clock),
        ("pwm", header.pwm_clock),
        ("ay8910", header.ay8910_clock),
        ("gb_dmg", header.gb_dmg_clock),
        ("nes_apu", header.nes_apu_clock),
        ("multipcm", header.multipcm_clock),
        ("upd7759", header.upd7759_clock),
        ("okim6258", header.okim6258_clock),
        ("okim6295", header.okim6295_clock),
        ("k051649", header.k051649_clock),
        ("k054539", header.k054539_clock),
        ("huc6280", header.huc6280_clock),
        ("c140", header.c140_clock),
        ("k053260", header.k053260_clock),
        ("pokey", header.pokey_clock),
        ("qsound", header.qsound_clock),
        ("scsp", header.scsp_clock),
        ("wonderswan", header.wonderswan_clock),
        ("vsu", header.vsu_clock),
        ("saa1099", header.saa1099_clock),
    ]
    .into_iter()
    .filter(|&(_, clock)| clock != 0)
    .collect()
}

/// Key/value rows describing a track.
pub fn summarize(header: &VgmHeader, gd3: &Gd3) -> Vec<(String, String)> {
    let mut rows: Vec<(String, String)> = vec![
        ("ident valid".into(), header.verify().to_string()),
        ("version".into(), format!("0x{:08X}", header.version)),
        ("eof offset".into(), format!("0x{:08X}", header.eof_offset)),
        ("data offset".into(), format!("0x{:08X}", header.data_offset)),
        ("loop offset".into(), format!("0x{:08X}", header.loop_offset)),
        ("total samples".into(), seconds(header.total_samples)),
        ("loop samples".into(), seconds(header.loop_samples)),
        ("rate".into(), header.rate.to_string()),
    ];

    let clocks = chip_clocks(header);
    if clocks.is_empty() {
        rows.push(("chips".into(), "(none)".into()));
    }
    for (chip, clock) in clocks {
        rows.push((format!("clock.{chip}"), format!("{clock} Hz")));
    }

    if gd3.is_empty() {
        rows.push(("gd3".into(), "(none)".into()));
    } else {
        for (key, value) in [
            ("gd3.track_name", &gd3.track_name),
            ("gd3.game_name", &gd3.game_name),
            ("gd3.system_name", &gd3.system_name),
            ("gd3.author", &gd3.author),
            ("gd3.release_date", &gd3.release_date),
        ] {
            rows.push((key.into(), value.clone()));
        }
    }
    rows
}

pub fn info(path: &Path, bytes: Vec<u8>) -> Result<()> {
    let mut session = TrackSession::open(
        MemorySource::from_bytes(bytes),
        chipstream::stream::DEFAULT_BUFFER_CAPACITY,
        chipstream::stream::DEFAULT_LOOP_CACHE_LEN,
        Arc::new(TickState::new()),
    )
    .with_context(|| format!("failed to parse VGM file: {}", path.display()))?;
    session.load_metadata()?;

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![Cell::new("Field"), Cell::new("Value")]);
    table.add_row(vec![Cell::new("file"), Cell::new(path.display().to_string())]);
    for (key, value) in summarize(session.header(), session.metadata()) {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    println!("{table}");
    Ok(())
}

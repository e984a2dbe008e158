use biorec::{RecordSession, SampleFrame, Signal, StreamMode};
use std::fs;
use std::path::Path;

// records are created in the cwd, so every test removes its own files
fn cleanup_record(record: &str, extensions: &[&str]) {
    for ext in extensions {
        let path = format!("{}.{}", record, ext);
        if Path::new(&path).exists() {
            fs::remove_file(&path).ok();
        }
    }
}

fn ecg_signal(label: &str) -> Signal {
    Signal {
        label: label.to_string(),
        gain: 200.0,
        baseline: 1024,
        frequency: 360.0,
        resolution: 11,
        units: "mV".to_string(),
    }
}

fn write_frames(record: &str, signals: Vec<Signal>, frames: &[Vec<i32>]) {
    let session = RecordSession::create(record, 360.0, signals).unwrap();
    let mut stream = session.open_signals(0, StreamMode::Write).unwrap();
    for frame in frames {
        stream.write(&SampleFrame::new(frame.clone())).unwrap();
    }
    stream.close().unwrap();
    session.close().unwrap();
}

#[test]
fn test_two_channel_roundtrip() {
    let record = "rt_two_channel";
    let frames: Vec<Vec<i32>> = (0..10).map(|i| vec![i, i * 2]).collect();
    write_frames(
        record,
        vec![ecg_signal("MLII"), ecg_signal("V5")],
        &frames,
    );

    let session = RecordSession::open(record).unwrap();
    let mut stream = session.open_signals(0, StreamMode::Read).unwrap();
    assert_eq!(stream.channels(), 2);
    assert_eq!(stream.frames(), 10);

    for expected in &frames {
        let frame = stream.read().unwrap().unwrap();
        assert_eq!(frame.samples(), expected.as_slice());
    }

    // frame 11 and beyond: EndOfStream, idempotently
    assert!(stream.read().unwrap().is_none());
    assert!(stream.read().unwrap().is_none());

    stream.close().unwrap();
    session.close().unwrap();
    cleanup_record(record, &["hea", "dat"]);
}

#[test]
fn test_saturating_write() {
    let record = "rt_saturate";
    write_frames(
        record,
        vec![ecg_signal("MLII")],
        &[vec![40_000], vec![-40_000]],
    );

    let session = RecordSession::open(record).unwrap();
    let mut stream = session.open_signals(0, StreamMode::Read).unwrap();
    assert_eq!(stream.read().unwrap().unwrap()[0], i16::MAX as i32);
    assert_eq!(stream.read().unwrap().unwrap()[0], i16::MIN as i32);
    session.close().unwrap();
    cleanup_record(record, &["hea", "dat"]);
}

#[test]
fn test_half_rate_logical_frequency() {
    let record = "rt_half_rate";
    let frames: Vec<Vec<i32>> = (0..20).map(|i| vec![i * 10]).collect();
    write_frames(record, vec![ecg_signal("MLII")], &frames);

    let session = RecordSession::open(record).unwrap();
    let mut stream = session.open_signals(0, StreamMode::Read).unwrap();
    stream.set_logical_frequency(180.0).unwrap();

    // logical frame k must be native frame 2k, held, not interpolated
    for k in 0..10 {
        let frame = stream.read().unwrap().unwrap();
        assert_eq!(frame[0], 2 * k * 10);
    }
    assert!(stream.read().unwrap().is_none());

    session.close().unwrap();
    cleanup_record(record, &["hea", "dat"]);
}

#[test]
fn test_seek_and_resume() {
    let record = "rt_seek";
    let frames: Vec<Vec<i32>> = (0..100).map(|i| vec![i]).collect();
    write_frames(record, vec![ecg_signal("MLII")], &frames);

    let session = RecordSession::open(record).unwrap();
    let mut stream = session.open_signals(0, StreamMode::Read).unwrap();

    stream.seek(50).unwrap();
    assert_eq!(stream.read().unwrap().unwrap()[0], 50);
    assert_eq!(stream.position(), 51);

    // rewinding is just another seek
    stream.seek(0).unwrap();
    assert_eq!(stream.read().unwrap().unwrap()[0], 0);

    assert!(stream.seek(100).is_err());
    assert!(stream.seek(u64::MAX).is_err());

    session.close().unwrap();
    cleanup_record(record, &["hea", "dat"]);
}

#[test]
fn test_channel_subset_read() {
    let record = "rt_subset";
    let frames: Vec<Vec<i32>> = (0..5).map(|i| vec![i, 100 + i]).collect();
    write_frames(
        record,
        vec![ecg_signal("MLII"), ecg_signal("V5")],
        &frames,
    );

    let session = RecordSession::open(record).unwrap();
    let mut stream = session.open_signals(1, StreamMode::Read).unwrap();
    assert_eq!(stream.channels(), 1);
    for i in 0..5 {
        let frame = stream.read().unwrap().unwrap();
        assert_eq!(frame.samples(), &[i]);
    }

    session.close().unwrap();
    cleanup_record(record, &["hea", "dat"]);
}

#[test]
fn test_physical_conversion_roundtrip() {
    let record = "rt_physical";
    write_frames(record, vec![ecg_signal("MLII")], &[vec![1224]]);

    let session = RecordSession::open(record).unwrap();
    let signal = session.catalog().describe(0).unwrap().clone();
    let mut stream = session.open_signals(0, StreamMode::Read).unwrap();
    let frame = stream.read().unwrap().unwrap();

    let physical = signal.to_physical(frame[0]);
    assert!((physical - 1.0).abs() < 1e-9);
    assert_eq!(signal.to_adc(physical), 1224);

    session.close().unwrap();
    cleanup_record(record, &["hea", "dat"]);
}

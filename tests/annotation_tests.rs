use biorec::{Annotation, AnnotationSource, RecordError, RecordSession, Signal, NORMAL, RHYTHM};
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

fn new_record(record: &str) -> RecordSession {
    let signal = Signal {
        label: "MLII".to_string(),
        gain: 200.0,
        baseline: 1024,
        frequency: 360.0,
        resolution: 11,
        units: "mV".to_string(),
    };
    RecordSession::create(record, 360.0, vec![signal]).unwrap()
}

#[test]
fn test_annotation_roundtrip_through_files() {
    let record = "ann_roundtrip";
    let events = vec![
        Annotation::new(0, NORMAL),
        Annotation::new(250, RHYTHM).with_aux(b"(N".as_slice()),
        Annotation {
            time: 700,
            code: 5,
            subtype: -1,
            channel: 1,
            num: 3,
            aux: None,
        },
        // far jump: forces the encoder through the long-gap escape
        Annotation::new(2_000_000, NORMAL),
    ];

    let session = new_record(record);
    let mut stream = session
        .open_annotations(vec![AnnotationSource::write("atr")])
        .unwrap();
    for event in &events {
        stream.write(event).unwrap();
    }
    stream.close().unwrap();
    session.close().unwrap();

    let session = RecordSession::open(record).unwrap();
    let mut stream = session
        .open_annotations(vec![AnnotationSource::read("atr")])
        .unwrap();
    let mut back = Vec::new();
    while let Some(ann) = stream.read().unwrap() {
        back.push(ann);
    }
    assert_eq!(back, events);
    assert!(stream.read().unwrap().is_none());
    assert_eq!(stream.position(), 2_000_000);

    session.close().unwrap();
    cleanup_record(record, &["hea", "atr"]);
}

#[test]
fn test_merge_two_annotators() {
    let record = "ann_merge";
    let session = new_record(record);

    let mut atr = session
        .open_annotations(vec![AnnotationSource::write("atr")])
        .unwrap();
    for time in [0, 100, 200] {
        atr.write(&Annotation::new(time, NORMAL)).unwrap();
    }
    atr.close().unwrap();

    let mut qrs = session
        .open_annotations(vec![AnnotationSource::write("qrs")])
        .unwrap();
    for time in [50, 100, 250] {
        qrs.write(&Annotation::new(time, 5)).unwrap();
    }
    qrs.close().unwrap();

    let mut merged = session
        .open_annotations(vec![
            AnnotationSource::read("atr"),
            AnnotationSource::read("qrs"),
        ])
        .unwrap();
    let mut seen = Vec::new();
    while let Some(ann) = merged.read().unwrap() {
        seen.push((ann.time, ann.code));
    }
    // equal times keep the listed source order: atr before qrs
    assert_eq!(
        seen,
        vec![
            (0, NORMAL),
            (50, 5),
            (100, NORMAL),
            (100, 5),
            (200, NORMAL),
            (250, 5),
        ]
    );

    session.close().unwrap();
    cleanup_record(record, &["hea", "atr", "qrs"]);
}

#[test]
fn test_filtered_copy_between_annotators() {
    let record = "ann_copy";
    let session = new_record(record);

    let mut atr = session
        .open_annotations(vec![AnnotationSource::write("atr")])
        .unwrap();
    atr.write(&Annotation::new(10, NORMAL)).unwrap();
    atr.write(&Annotation::new(20, RHYTHM).with_aux(b"(AFIB".as_slice()))
        .unwrap();
    atr.write(&Annotation::new(30, NORMAL)).unwrap();
    atr.close().unwrap();

    let mut stream = session
        .open_annotations(vec![
            AnnotationSource::read("atr"),
            AnnotationSource::write("beats"),
        ])
        .unwrap();
    while let Some(ann) = stream.read().unwrap() {
        if ann.code == NORMAL {
            stream.write(&ann).unwrap();
        }
    }
    stream.close().unwrap();

    let mut beats = session
        .open_annotations(vec![AnnotationSource::read("beats")])
        .unwrap();
    let mut times = Vec::new();
    while let Some(ann) = beats.read().unwrap() {
        assert_eq!(ann.code, NORMAL);
        times.push(ann.time);
    }
    assert_eq!(times, vec![10, 30]);

    session.close().unwrap();
    cleanup_record(record, &["hea", "atr", "beats"]);
}

#[test]
fn test_fan_out_to_two_writers() {
    let record = "ann_fanout";
    let session = new_record(record);

    let mut stream = session
        .open_annotations(vec![
            AnnotationSource::write("atr"),
            AnnotationSource::write("bak"),
        ])
        .unwrap();
    stream.write(&Annotation::new(5, NORMAL)).unwrap();
    stream.write(&Annotation::new(15, 5)).unwrap();
    stream.close().unwrap();

    for annotator in ["atr", "bak"] {
        let mut back = session
            .open_annotations(vec![AnnotationSource::read(annotator)])
            .unwrap();
        assert_eq!(back.read().unwrap().unwrap().time, 5);
        assert_eq!(back.read().unwrap().unwrap().time, 15);
        assert!(back.read().unwrap().is_none());
    }

    session.close().unwrap();
    cleanup_record(record, &["hea", "atr", "bak"]);
}

#[test]
fn test_fixed_width_file_is_block_padded() {
    let record = "ann_fixed";
    let session = new_record(record);

    let mut stream = session
        .open_annotations(vec![AnnotationSource::write_fixed("aha")])
        .unwrap();
    stream.write(&Annotation::new(100, NORMAL)).unwrap();
    stream.close().unwrap();
    session.close().unwrap();

    let bytes = fs::read(format!("{}.aha", record)).unwrap();
    assert_eq!(bytes.len(), 1024);
    assert!(bytes[16..].iter().all(|&b| b == 0xff));

    cleanup_record(record, &["hea", "aha"]);
}

#[test]
fn test_missing_annotator_is_an_error() {
    let record = "ann_missing";
    let session = new_record(record);

    let err = session
        .open_annotations(vec![AnnotationSource::read("nope")])
        .err()
        .unwrap();
    assert!(matches!(err, RecordError::AnnotatorNotFound { .. }));

    session.close().unwrap();
    cleanup_record(record, &["hea"]);
}

#[test]
fn test_aux_text_lookup() {
    let record = "ann_aux";
    let session = new_record(record);

    let mut stream = session
        .open_annotations(vec![AnnotationSource::write("atr")])
        .unwrap();
    stream
        .write(&Annotation::new(0, RHYTHM).with_aux(b"(N".as_slice()))
        .unwrap();
    stream.close().unwrap();

    let mut stream = session
        .open_annotations(vec![AnnotationSource::read("atr")])
        .unwrap();
    let ann = stream.read().unwrap().unwrap();
    assert_eq!(ann.aux_text(), Some("(N"));
    assert_eq!(session.code_table().mnemonic(ann.code).unwrap(), "+");

    session.close().unwrap();
    cleanup_record(record, &["hea", "atr"]);
}

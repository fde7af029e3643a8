use std::io::Cursor;

use resdata_reader::resdata::cache::CacheEntry;
use resdata_reader::{
    Endian, Keyword, KeywordCache, KwData, KwHeader, KwType, RecordStream, ResdataError,
};

fn memory_stream(endian: Endian) -> RecordStream<Cursor<Vec<u8>>> {
    RecordStream::from_stream(Cursor::new(Vec::new()), endian)
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[test]
fn record_round_trip_including_split_boundary() {
    // 4000 is the per-sub-record limit; exercise both sides of it and exact
    // multiples.
    let lengths = [0usize, 1, 7, 3999, 4000, 4001, 8000, 12003];
    for endian in [Endian::Big, Endian::Little] {
        let mut stream = memory_stream(endian);
        for &len in &lengths {
            stream.write_record(&pattern(len)).expect("write record");
        }
        stream.rewind().expect("rewind");
        for &len in &lengths {
            let data = stream.read_record().expect("read record");
            assert_eq!(data, pattern(len), "length {} with {:?}", len, endian);
        }
        assert!(
            stream.read_record_opt().expect("eof probe").is_none(),
            "expected clean EOF after last record"
        );
    }
}

#[test]
fn skip_record_reports_length_and_advances() {
    let mut stream = memory_stream(Endian::Big);
    stream.write_record(&pattern(4001)).expect("write long");
    stream.write_record(b"after").expect("write short");
    stream.rewind().expect("rewind");

    let skipped = stream.skip_record().expect("skip");
    assert_eq!(skipped, 4001);
    assert_eq!(stream.read_record().expect("read"), b"after");
}

#[test]
fn mismatched_trailing_marker_is_corruption() {
    let mut stream = memory_stream(Endian::Big);
    stream.write_record(b"payload!").expect("write");
    let mut bytes = stream.into_inner().into_inner();
    // Trailing marker starts after the 4-byte leading marker and 8 payload
    // bytes; flip its low byte.
    bytes[4 + 8 + 3] ^= 0x5A;
    let mut corrupt = RecordStream::from_stream(Cursor::new(bytes), Endian::Big);
    match corrupt.read_record() {
        Err(ResdataError::RecordLengthMismatch { leading, .. }) => assert_eq!(leading, 8),
        other => panic!("expected RecordLengthMismatch, got {:?}", other),
    }
}

#[test]
fn oversized_length_marker_fails_before_allocating() {
    // A marker above the sub-record limit cannot come from a valid writer;
    // it must be rejected as corruption, not used as an allocation size.
    for marker in [4001i32, i32::MAX] {
        let mut bytes = marker.to_be_bytes().to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        let mut stream = RecordStream::from_stream(Cursor::new(bytes), Endian::Big);
        assert!(
            matches!(stream.read_record(), Err(ResdataError::InvalidFormat(_))),
            "marker {} accepted",
            marker
        );
    }

    // skip_record applies the same bound.
    let bytes = i32::MAX.to_be_bytes().to_vec();
    let mut stream = RecordStream::from_stream(Cursor::new(bytes), Endian::Big);
    assert!(matches!(
        stream.skip_record(),
        Err(ResdataError::InvalidFormat(_))
    ));
}

#[test]
fn truncated_record_fails_with_io_error() {
    // Leading marker promises 100 bytes, stream holds 3.
    let mut bytes = 100i32.to_be_bytes().to_vec();
    bytes.extend_from_slice(&[1, 2, 3]);
    let mut stream = RecordStream::from_stream(Cursor::new(bytes), Endian::Big);
    assert!(matches!(
        stream.read_record(),
        Err(ResdataError::Io(_))
    ));
}

fn sample_keywords() -> Vec<Keyword> {
    vec![
        Keyword::new("INTHEAD", KwData::Int(vec![-4, 0, 7, 2_000_000])).expect("int kw"),
        Keyword::new("PORO", KwData::Float(vec![0.25, -0.5, 1.0, 0.125])).expect("float kw"),
        Keyword::new("DOUBHEAD", KwData::Double(vec![0.5, -2.0, 1024.0])).expect("double kw"),
        Keyword::new("LOGIHEAD", KwData::Bool(vec![true, false, false, true])).expect("bool kw"),
        Keyword::new("ZNAMES", KwData::Str(vec!["FIELD".to_string(), "AB CD".to_string()]))
            .expect("str kw"),
        Keyword::new("ENDSTEP", KwData::Message(0)).expect("mess kw"),
    ]
}

#[test]
fn keyword_round_trip_binary() {
    for endian in [Endian::Big, Endian::Little] {
        let keywords = sample_keywords();
        let mut stream = memory_stream(endian);
        for kw in &keywords {
            kw.write(&mut stream).expect("write keyword");
        }
        stream.rewind().expect("rewind");
        for expected in &keywords {
            let kw = Keyword::read(&mut stream)
                .expect("read keyword")
                .expect("keyword present");
            assert_eq!(&kw, expected, "round trip of {}", expected.name());
        }
        assert!(Keyword::read(&mut stream).expect("eof probe").is_none());
    }
}

#[test]
fn keyword_round_trip_formatted() {
    let keywords = sample_keywords();
    let mut stream = RecordStream::from_formatted(Cursor::new(Vec::new()));
    for kw in &keywords {
        kw.write(&mut stream).expect("write formatted keyword");
    }
    stream.rewind().expect("rewind");
    for expected in &keywords {
        let kw = Keyword::read(&mut stream)
            .expect("read formatted keyword")
            .expect("keyword present");
        assert_eq!(&kw, expected, "formatted round trip of {}", expected.name());
    }
    assert!(Keyword::read(&mut stream).expect("eof probe").is_none());
}

#[test]
fn non_finite_elements_are_rejected_at_construction() {
    for value in [f32::INFINITY, f32::NEG_INFINITY, f32::NAN] {
        assert!(matches!(
            Keyword::new("PORO", KwData::Float(vec![0.5, value])),
            Err(ResdataError::InvalidFormat(_))
        ));
    }
    assert!(matches!(
        Keyword::new("DOUBHEAD", KwData::Double(vec![f64::NAN])),
        Err(ResdataError::InvalidFormat(_))
    ));
}

#[test]
fn unknown_type_tag_is_fatal() {
    let mut stream = memory_stream(Endian::Big);
    let mut header = Vec::new();
    header.extend_from_slice(b"BADKW   ");
    header.extend_from_slice(&3i32.to_be_bytes());
    header.extend_from_slice(b"XXXX");
    stream.write_record(&header).expect("write raw header");
    stream.rewind().expect("rewind");
    match KwHeader::read(&mut stream) {
        Err(ResdataError::UnknownTypeTag(tag)) => assert_eq!(tag, "XXXX"),
        other => panic!("expected UnknownTypeTag, got {:?}", other),
    }
}

#[test]
fn seek_kw_finds_first_match_and_restores_on_miss() {
    let mut stream = memory_stream(Endian::Big);
    Keyword::new("PORO", KwData::Float(vec![0.5]))
        .expect("kw")
        .write(&mut stream)
        .expect("write");
    Keyword::new("PERMX", KwData::Float(vec![100.0]))
        .expect("kw")
        .write(&mut stream)
        .expect("write");
    Keyword::new("PORO", KwData::Float(vec![0.75]))
        .expect("kw")
        .write(&mut stream)
        .expect("write");
    stream.rewind().expect("rewind");

    assert!(Keyword::seek_kw(&mut stream, "PERMX").expect("seek"));
    let kw = Keyword::read(&mut stream)
        .expect("read")
        .expect("keyword at match");
    assert_eq!(kw.name(), "PERMX");

    // Scan continues from the current position; the earlier PORO is behind
    // us, only the second one is found.
    assert!(Keyword::seek_kw(&mut stream, "PORO").expect("seek"));
    let kw = Keyword::read(&mut stream)
        .expect("read")
        .expect("keyword at match");
    assert_eq!(kw.as_float(), Some(&[0.75f32][..]));

    let before = stream.tell().expect("tell");
    assert!(!Keyword::seek_kw(&mut stream, "SWAT").expect("seek miss"));
    assert_eq!(stream.tell().expect("tell"), before, "miss restores position");
}

#[test]
fn in_place_replace_requires_identical_header() {
    let mut stream = memory_stream(Endian::Big);
    let original = Keyword::new("ACTNUM", KwData::Int(vec![1, 0, 1])).expect("kw");
    original.write(&mut stream).expect("write");

    let replacement = Keyword::new("ACTNUM", KwData::Int(vec![0, 1, 0])).expect("kw");
    replacement.replace_at(&mut stream, 0).expect("replace");
    stream.rewind().expect("rewind");
    let kw = Keyword::read(&mut stream).expect("read").expect("present");
    assert_eq!(kw.as_int(), Some(&[0, 1, 0][..]));

    // Same name, different count: rejected before any byte is written.
    let wrong = Keyword::new("ACTNUM", KwData::Int(vec![1, 1])).expect("kw");
    match wrong.replace_at(&mut stream, 0) {
        Err(ResdataError::ReplaceMismatch { keyword }) => assert_eq!(keyword, "ACTNUM"),
        other => panic!("expected ReplaceMismatch, got {:?}", other),
    }
    stream.rewind().expect("rewind");
    let kw = Keyword::read(&mut stream).expect("read").expect("present");
    assert_eq!(kw.as_int(), Some(&[0, 1, 0][..]), "rejected replace left data intact");
}

#[test]
fn cache_scan_preserves_file_order() {
    let mut stream = memory_stream(Endian::Big);
    for name in ["DIMENS", "PORO", "PERMX", "PORO"] {
        Keyword::new(name, KwData::Int(vec![1, 2, 3]))
            .expect("kw")
            .write(&mut stream)
            .expect("write");
    }
    let cache = KeywordCache::scan(&mut stream).expect("scan");

    assert_eq!(cache.len(), 4);
    let names: Vec<&str> = cache.iter().map(|e| e.header.name.as_str()).collect();
    assert_eq!(names, ["DIMENS", "PORO", "PERMX", "PORO"]);
    assert_eq!(cache.count_named("PORO"), 2);
    assert_eq!(cache.count_named("SWAT"), 0);

    let poro = cache.named("PORO");
    assert_eq!(poro.len(), 2);
    assert!(poro[0].offset < poro[1].offset, "file order within a name");
    assert_eq!(cache.first_offset("PORO"), Some(poro[0].offset));

    // Offsets are usable directly against the stream.
    stream
        .seek(cache.first_offset("PERMX").expect("PERMX offset"))
        .expect("seek");
    let kw = Keyword::read(&mut stream).expect("read").expect("present");
    assert_eq!(kw.name(), "PERMX");
}

#[test]
fn cache_offset_sort_is_stable() {
    let mut cache = KeywordCache::new();
    let entry = |name: &str, offset| CacheEntry {
        header: KwHeader::new(name, KwType::Int, 0).expect("header"),
        offset,
    };
    cache.push(entry("FIRST", 40));
    cache.push(entry("SECOND", 16));
    cache.push(entry("THIRD", 16));
    cache.push(entry("FOURTH", 0));

    let sorted: Vec<&str> = cache
        .iter_sorted_by_offset()
        .into_iter()
        .map(|e| e.header.name.as_str())
        .collect();
    // Equal offsets keep first-seen order.
    assert_eq!(sorted, ["FOURTH", "SECOND", "THIRD", "FIRST"]);

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.first_offset("FIRST"), None);
}

#[test]
fn file_backed_stream_round_trip() {
    let path = std::env::temp_dir().join(format!("resdata-codec-{}.bin", std::process::id()));
    {
        let mut writer =
            RecordStream::open_writer(&path, Endian::Big).expect("open writer");
        for kw in sample_keywords() {
            kw.write(&mut writer).expect("write keyword");
        }
    }
    let mut reader = RecordStream::open_reader(&path, Endian::Big).expect("open reader");
    for expected in sample_keywords() {
        let kw = Keyword::read(&mut reader)
            .expect("read keyword")
            .expect("keyword present");
        assert_eq!(kw, expected);
    }
    std::fs::remove_file(&path).expect("cleanup");
}

// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use super::open_small;
use tempfile::tempdir;

#[test]
fn test_compact_short_sentinels() {
    let dir = tempdir().unwrap();
    let (chronicle, _) = open_small(&dir, "compact_short");
    let cases: [(i16, usize); 9] = [
        (0, 1),
        (1, 1),
        (-1, 1),
        (127, 1),
        (-128, 3),
        (-127, 3),
        (-126, 3),
        (i16::MIN, 1),
        (i16::MAX, 1),
    ];

    let mut w = chronicle.create_excerpt();
    for (v, size) in cases {
        w.start_excerpt(3).unwrap();
        w.write_compact_short(v).unwrap();
        assert_eq!(w.position(), size, "encoded size of {v}");
        w.finish().unwrap();
    }

    let mut r = chronicle.create_excerpt();
    for (i, (v, size)) in cases.iter().enumerate() {
        assert!(r.index(i as i64).unwrap());
        assert_eq!(r.capacity(), *size);
        assert_eq!(r.read_compact_short().unwrap(), *v);
        r.finish().unwrap();
    }
}

#[test]
fn test_compact_widths() {
    let dir = tempdir().unwrap();
    let (chronicle, _) = open_small(&dir, "compact_widths");
    let mut w = chronicle.create_excerpt();
    w.start_excerpt(256).unwrap();

    let mut sizes = Vec::new();
    let mark = |w: &crate::Excerpt<'_>, sizes: &mut Vec<usize>| sizes.push(w.position());

    w.write_compact_unsigned_short(254).unwrap();
    mark(&w, &mut sizes);
    w.write_compact_unsigned_short(255).unwrap();
    mark(&w, &mut sizes);
    w.write_compact_unsigned_short(u16::MAX).unwrap();
    mark(&w, &mut sizes);
    w.write_compact_int(-32765).unwrap();
    mark(&w, &mut sizes);
    w.write_compact_int(i32::MIN).unwrap();
    mark(&w, &mut sizes);
    w.write_compact_int(i32::MAX).unwrap();
    mark(&w, &mut sizes);
    w.write_compact_int(-32766).unwrap();
    mark(&w, &mut sizes);
    w.write_compact_int(70_000).unwrap();
    mark(&w, &mut sizes);
    w.write_compact_unsigned_int(0xFFFE).unwrap();
    mark(&w, &mut sizes);
    w.write_compact_unsigned_int(0xFFFF).unwrap();
    mark(&w, &mut sizes);
    w.write_compact_unsigned_int(u32::MAX).unwrap();
    mark(&w, &mut sizes);
    w.write_compact_long(-5).unwrap();
    mark(&w, &mut sizes);
    w.write_compact_long(i64::MIN).unwrap();
    mark(&w, &mut sizes);
    w.write_compact_long(i64::MAX).unwrap();
    mark(&w, &mut sizes);
    w.write_compact_long(i32::MIN as i64).unwrap();
    mark(&w, &mut sizes);
    w.write_compact_long(1 << 40).unwrap();
    mark(&w, &mut sizes);
    w.write_compact_double(0.25).unwrap();
    mark(&w, &mut sizes);
    w.write_compact_double(0.1).unwrap();
    mark(&w, &mut sizes);
    w.write_compact_double(f64::NAN).unwrap();
    mark(&w, &mut sizes);
    w.finish().unwrap();

    let deltas: Vec<usize> = sizes
        .iter()
        .scan(0, |prev, &p| {
            let d = p - *prev;
            *prev = p;
            Some(d)
        })
        .collect();
    assert_eq!(
        deltas,
        vec![1, 3, 3, 2, 2, 2, 6, 6, 2, 6, 6, 4, 4, 4, 12, 12, 4, 12, 12]
    );

    let mut r = chronicle.create_excerpt();
    assert!(r.index(0).unwrap());
    assert_eq!(r.read_compact_unsigned_short().unwrap(), 254);
    assert_eq!(r.read_compact_unsigned_short().unwrap(), 255);
    assert_eq!(r.read_compact_unsigned_short().unwrap(), u16::MAX);
    assert_eq!(r.read_compact_int().unwrap(), -32765);
    assert_eq!(r.read_compact_int().unwrap(), i32::MIN);
    assert_eq!(r.read_compact_int().unwrap(), i32::MAX);
    assert_eq!(r.read_compact_int().unwrap(), -32766);
    assert_eq!(r.read_compact_int().unwrap(), 70_000);
    assert_eq!(r.read_compact_unsigned_int().unwrap(), 0xFFFE);
    assert_eq!(r.read_compact_unsigned_int().unwrap(), 0xFFFF);
    assert_eq!(r.read_compact_unsigned_int().unwrap(), u32::MAX);
    assert_eq!(r.read_compact_long().unwrap(), -5);
    assert_eq!(r.read_compact_long().unwrap(), i64::MIN);
    assert_eq!(r.read_compact_long().unwrap(), i64::MAX);
    assert_eq!(r.read_compact_long().unwrap(), i32::MIN as i64);
    assert_eq!(r.read_compact_long().unwrap(), 1 << 40);
    assert_eq!(r.read_compact_double().unwrap(), 0.25);
    assert_eq!(r.read_compact_double().unwrap(), 0.1);
    assert!(r.read_compact_double().unwrap().is_nan());
    assert_eq!(r.remaining(), 0);
}

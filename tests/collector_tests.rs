//! Integration tests for the memory usage collector.
//!
//! These tests build a fake procfs/debugfs tree in a temporary directory and
//! drive the public API end to end.

use mali_memtrack::{
    CollectorConfig, MemoryUsageCollector, MemtrackFlags, MemtrackRecord, MemtrackType,
    ScanLimits, RECORD_TEMPLATES,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const HEAP_HEADER: &str = "          client              pid             size\n";

/// Fake kernel tree with proc, GPU client and heap table sources.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("proc")).unwrap();
        fs::create_dir_all(dir.path().join("mali/mem")).unwrap();
        fs::create_dir_all(dir.path().join("ion")).unwrap();
        fs::write(dir.path().join("ion/cma-heap"), HEAP_HEADER).unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn process(&self, pid: u32, cmdline: &[u8]) -> &Self {
        let dir = self.root().join("proc").join(pid.to_string());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("cmdline"), cmdline).unwrap();
        self
    }

    fn client(&self, name: &str, content: &str) -> &Self {
        fs::write(self.root().join("mali/mem").join(name), content).unwrap();
        self
    }

    fn heap_rows(&self, rows: &[(&str, u32, u64)]) -> &Self {
        let mut table = String::from(HEAP_HEADER);
        for (client, pid, size) in rows {
            table.push_str(&format!("{:>16} {:>16} {:>16}\n", client, pid, size));
        }
        fs::write(self.root().join("ion/cma-heap"), table).unwrap();
        self
    }

    fn collector(&self) -> MemoryUsageCollector {
        MemoryUsageCollector::new(CollectorConfig {
            proc_root: self.root().join("proc"),
            client_dir: self.root().join("mali/mem"),
            heap_table: self.root().join("ion/cma-heap"),
            limits: ScanLimits::default(),
        })
    }
}

fn fixed_flags() -> MemtrackFlags {
    MemtrackFlags::SMAPS_UNACCOUNTED | MemtrackFlags::PRIVATE | MemtrackFlags::NONSECURE
}

#[test]
fn test_end_to_end_sums_gpu_and_heap() {
    let fx = Fixture::new();
    fx.process(1234, b"com.app.test\0")
        .client(
            "1234_0",
            "com.app.test\n\
             Channel: 0 (kctx: 0xffffffc0)\n\
             Total allocated memory: 2822048\n",
        )
        .heap_rows(&[
            ("com.app.test", 1234, 33423360),
            ("surfaceflinger", 179, 8388608),
        ]);

    let mut records = [MemtrackRecord::default(); 1];
    let available = fx
        .collector()
        .get_memory(1234, MemtrackType::Graphics, &mut records)
        .unwrap();

    assert_eq!(available, 1);
    assert_eq!(records[0].size_in_bytes, 36245408);
    assert_eq!(records[0].flags, fixed_flags());
}

#[test]
fn test_heap_rows_summed_per_pid() {
    let fx = Fixture::new();
    fx.process(100, b"fg.app\0")
        .heap_rows(&[("fg", 100, 1000), ("bg", 200, 2000), ("fg2", 100, 500)]);

    let usage = fx.collector().unaccounted_memory(100).unwrap();
    assert_eq!(usage.heap_bytes, 1500);
    assert_eq!(usage.gpu_bytes, 0);
    assert_eq!(usage.gpu_client, None);
    assert_eq!(usage.total_bytes(), 1500);
}

#[test]
fn test_no_matches_is_zero_record() {
    let fx = Fixture::new();
    fx.process(42, b"com.lonely\0")
        .client("1_0", "com.someone.else\nTotal allocated memory: 777\n")
        .heap_rows(&[("other", 43, 4096)]);

    let mut records = [MemtrackRecord {
        size_in_bytes: 999,
        flags: MemtrackFlags::empty(),
    }];
    let available = fx
        .collector()
        .get_memory(42, MemtrackType::Other, &mut records)
        .unwrap();

    assert_eq!(available, 1);
    assert_eq!(records[0].size_in_bytes, 0);
    assert_eq!(records[0].flags, RECORD_TEMPLATES[0].flags);
}

#[test]
fn test_total_found_before_last_window() {
    let fx = Fixture::new();
    let mut content = String::from("com.app.test\nTotal allocated memory: 65536\n");
    for i in 0..8 {
        content.push_str(&format!("  mmu page table {:02}: 0 entries in use\n", i));
    }
    fx.process(7, b"com.app.test\0").client("7_0", &content);

    let usage = fx.collector().unaccounted_memory(7).unwrap();
    assert_eq!(usage.gpu_bytes, 65536);
    assert_eq!(usage.gpu_client, Some(fx.root().join("mali/mem/7_0")));
}

#[test]
fn test_matching_client_without_total_contributes_zero() {
    let fx = Fixture::new();
    fx.process(8, b"com.app.test\0")
        .client("8_0", "com.app.test\nallocation log truncated\n")
        .heap_rows(&[("com.app.test", 8, 2048)]);

    let usage = fx.collector().unaccounted_memory(8).unwrap();
    assert_eq!(usage.gpu_bytes, 0);
    assert_eq!(usage.total_bytes(), 2048);
}

#[test]
fn test_identity_is_cut_at_first_nul() {
    let fx = Fixture::new();
    fx.process(9, b"/system/bin/mediaserver\0--verbose\0")
        .client(
            "9_0",
            "/system/bin/mediaserver\nTotal allocated memory: 1024\n",
        );

    let usage = fx.collector().unaccounted_memory(9).unwrap();
    assert_eq!(usage.gpu_bytes, 1024);
}

#[test]
fn test_unreadable_cmdline_fails() {
    let fx = Fixture::new();
    let collector = fx.collector();

    let mut records = [MemtrackRecord::default(); 1];
    let mut num_records = 1;
    let ret = collector.get_memory_raw(555, MemtrackType::Gl, &mut records, &mut num_records);

    assert_eq!(ret, -libc::ENOENT);
    assert_eq!(num_records, 1);
}

#[test]
fn test_missing_client_dir_fails() {
    let fx = Fixture::new();
    fx.process(10, b"com.app.test\0");
    fs::remove_dir_all(fx.root().join("mali")).unwrap();

    let err = fx.collector().unaccounted_memory(10).unwrap_err();
    assert_eq!(err.errno(), -libc::ENOENT);
}

#[test]
fn test_unopenable_client_entry_fails() {
    let fx = Fixture::new();
    fx.process(12, b"com.app.test\0")
        .heap_rows(&[("com.app.test", 12, 4096)]);
    std::os::unix::fs::symlink(
        fx.root().join("mali/missing"),
        fx.root().join("mali/mem/12_0"),
    )
    .unwrap();

    let mut records = [MemtrackRecord::default(); 1];
    let mut num_records = 1;
    let ret = fx
        .collector()
        .get_memory_raw(12, MemtrackType::Gl, &mut records, &mut num_records);

    assert_eq!(ret, -libc::ENOENT);
    assert_eq!(num_records, 1);
}

#[test]
fn test_missing_heap_table_fails() {
    let fx = Fixture::new();
    fx.process(11, b"com.app.test\0")
        .client("11_0", "com.app.test\nTotal allocated memory: 1\n");
    fs::remove_file(fx.root().join("ion/cma-heap")).unwrap();

    let mut records = [MemtrackRecord::default(); 1];
    let mut num_records = 1;
    let ret = fx
        .collector()
        .get_memory_raw(11, MemtrackType::Gl, &mut records, &mut num_records);
    assert_eq!(ret, -libc::ENOENT);
}

#[test]
fn test_zero_capacity_reports_count_only() {
    // No process or sources exist: a count-only query must not touch them.
    let collector = MemoryUsageCollector::new(CollectorConfig {
        proc_root: "/nonexistent/proc".into(),
        client_dir: "/nonexistent/mali".into(),
        heap_table: "/nonexistent/heap".into(),
        limits: ScanLimits::default(),
    });

    let mut records = [MemtrackRecord {
        size_in_bytes: 31337,
        flags: MemtrackFlags::SECURE,
    }];
    let mut num_records = 0;
    let ret = collector.get_memory_raw(1, MemtrackType::Camera, &mut records, &mut num_records);

    assert_eq!(ret, 0);
    assert_eq!(num_records, 1);
    assert_eq!(records[0].size_in_bytes, 31337);
    assert_eq!(records[0].flags, MemtrackFlags::SECURE);

    assert_eq!(collector.get_memory(1, MemtrackType::Camera, &mut []).unwrap(), 1);
}

#[test]
fn test_larger_capacity_reports_true_count() {
    let fx = Fixture::new();
    fx.process(12, b"com.app.test\0")
        .heap_rows(&[("com.app.test", 12, 4096)]);

    let mut records = [MemtrackRecord::default(); 4];
    let mut num_records = 4;
    let ret = fx
        .collector()
        .get_memory_raw(12, MemtrackType::Multimedia, &mut records, &mut num_records);

    assert_eq!(ret, 0);
    assert_eq!(num_records, 1);
    assert_eq!(records[0].size_in_bytes, 4096);
    assert_eq!(records[1], MemtrackRecord::default());
}

#[test]
fn test_concurrent_queries_share_collector() {
    let fx = Fixture::new();
    fx.process(20, b"com.first\0")
        .process(21, b"com.second\0")
        .client("20_0", "com.first\nTotal allocated memory: 100\n")
        .client("21_0", "com.second\nTotal allocated memory: 200\n")
        .heap_rows(&[("com.first", 20, 1), ("com.second", 21, 2)]);

    let collector = fx.collector();
    let (first, second) = std::thread::scope(|s| {
        let a = s.spawn(|| collector.unaccounted_memory(20).unwrap());
        let b = s.spawn(|| collector.unaccounted_memory(21).unwrap());
        (a.join().unwrap(), b.join().unwrap())
    });

    assert_eq!(first.total_bytes(), 101);
    assert_eq!(second.total_bytes(), 202);
}

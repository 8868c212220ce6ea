//! 自适应缓冲尺寸策略的契约：爬坡方向、饱和边界、共享尺寸表与配置注入。

use std::sync::Arc;

use kiln_core::{
    AdaptiveBufferConfig, AdaptiveBufferSizer, BufferSizeTable, DEFAULT_BUFFER_SIZES,
    ErrorCategory, codes,
};
use tracing_test::traced_test;

fn table(sizes: &[usize]) -> Arc<BufferSizeTable> {
    Arc::new(BufferSizeTable::new(sizes.to_vec()).expect("测试用尺寸表应合法"))
}

/// 新连接从 1 KiB 起步，持续读满后每次只前进一格，最终停在 64 KiB。
#[test]
fn sustained_full_reads_climb_to_the_top_one_step_at_a_time() {
    let mut sizer = AdaptiveBufferSizer::default();
    assert_eq!(sizer.current_size(), 1024);

    let mut climbed = vec![sizer.current_size()];
    for _ in 0..DEFAULT_BUFFER_SIZES.len() + 3 {
        let size = sizer.current_size();
        sizer.on_read_completed(size);
        climbed.push(sizer.current_size());
    }

    let distinct: Vec<_> = climbed
        .windows(2)
        .filter(|pair| pair[0] != pair[1])
        .map(|pair| pair[1])
        .collect();
    assert_eq!(distinct, DEFAULT_BUFFER_SIZES[1..].to_vec());
    assert_eq!(sizer.current_size(), 64 * 1024);
}

/// 从任意位置出发，`len - 1` 次读满必达表尾，`len - 1` 次零字节读必回表头。
#[test]
fn len_minus_one_steps_reach_either_end() {
    let sizes = [256, 512, 1024, 8192, 9000];
    let shared = table(&sizes);

    for start in 0..sizes.len() {
        let mut growing = AdaptiveBufferSizer::with_initial_index(Arc::clone(&shared), start);
        for _ in 0..sizes.len() - 1 {
            growing.on_read_completed(usize::MAX);
        }
        assert_eq!(growing.current_size(), 9000, "start = {start}");

        let mut shrinking = AdaptiveBufferSizer::with_initial_index(Arc::clone(&shared), start);
        for _ in 0..sizes.len() - 1 {
            shrinking.on_read_completed(0);
        }
        assert_eq!(shrinking.current_size(), 256, "start = {start}");
    }
}

/// 恰好读满视为增长信号；少一个字节即收缩。
#[test]
fn exact_fill_grows_and_short_by_one_shrinks() {
    let mut sizer = AdaptiveBufferSizer::with_initial_index(table(&[100, 200, 300]), 1);
    sizer.on_read_completed(200);
    assert_eq!(sizer.current_size(), 300);
    sizer.on_read_completed(299);
    assert_eq!(sizer.current_size(), 200);
}

/// 多个连接共享同一张表，但各自的索引互不影响。
#[test]
fn sizers_share_the_table_but_not_the_index() {
    let shared = BufferSizeTable::shared_default();
    let mut busy = AdaptiveBufferSizer::new(Arc::clone(&shared));
    let idle = AdaptiveBufferSizer::new(Arc::clone(&shared));

    busy.on_read_completed(1024);
    busy.on_read_completed(2048);

    assert!(Arc::ptr_eq(busy.table(), idle.table()));
    assert_eq!(busy.current_size(), 4096);
    assert_eq!(idle.current_size(), 1024);
}

/// 有符号计数来源上报负数：以 `InvalidArgument` 拒绝，状态不变，并留下告警日志。
#[traced_test]
#[test]
fn negative_report_is_rejected_without_moving() {
    let mut sizer = AdaptiveBufferSizer::with_initial_index(table(&[10, 20, 30]), 1);

    let err = sizer.try_on_read_completed(-1).unwrap_err();
    assert_eq!(err.code(), codes::BUFFER_NEGATIVE_READ);
    assert_eq!(err.category(), ErrorCategory::InvalidArgument);
    assert_eq!(sizer.current_size(), 20);
    assert!(logs_contain("rejected negative read size"));

    sizer.try_on_read_completed(20).unwrap();
    assert_eq!(sizer.current_size(), 30);
}

/// 部署配置注入自定义尺寸表与起始索引。
#[test]
fn configured_table_drives_new_connections() {
    let config = AdaptiveBufferConfig {
        sizes: vec![4096, 16384, 65536],
        initial_index: 1,
    };
    let shared = config.build_table().unwrap();
    let mut sizer = config.new_sizer(Arc::clone(&shared));
    assert_eq!(sizer.current_size(), 16384);

    sizer.on_read_completed(10);
    sizer.on_read_completed(10);
    assert_eq!(sizer.current_size(), 4096);

    sizer.reset();
    assert_eq!(sizer.index(), 0);

    let broken = AdaptiveBufferConfig {
        sizes: vec![4096],
        initial_index: 0,
    };
    let err: kiln_core::CoreError = broken.build_table().unwrap_err().into();
    assert_eq!(err.code(), codes::CONFIG_INVALID);
}

//! `InterceptingExecutor` 契约：委托执行器上的每一次恢复都带有上下文括号。

#[path = "support/mod.rs"]
mod support;

use std::sync::{Arc, Mutex};

use futures::{channel::oneshot, executor::block_on};
use kiln_core::{
    InterceptingExecutor, TaskCancellationStrategy, TaskError, TaskExecutor, context_cell,
};

use support::{ClosedExecutor, PoolExecutor, thread_name, yield_now};

context_cell! {
    static REQUEST: &'static str;
}

/// 在单线程池上直接读取槽位，确认括号结束后唯一的工作线程上没有残留。
fn slot_on_worker(pool: &Arc<PoolExecutor>) -> Option<&'static str> {
    block_on(pool.spawn(async { REQUEST.current() }).join()).expect("读取任务应完成")
}

/// 绑定 `"req-42"` 的计算挂起两次，三次恢复都观测到同一个值，结束后工作线程槽位为空。
#[test]
fn three_resumptions_observe_the_bound_value() {
    let pool = Arc::new(PoolExecutor::new(1));
    let executor = InterceptingExecutor::new(Arc::clone(&pool), &REQUEST, "req-42");

    let handle = executor.spawn(async {
        let mut seen = vec![(REQUEST.current(), thread_name())];
        yield_now().await;
        seen.push((REQUEST.current(), thread_name()));
        yield_now().await;
        seen.push((REQUEST.current(), thread_name()));
        seen
    });

    let seen = block_on(handle.join()).expect("任务应成功完成");
    assert_eq!(seen.len(), 3);
    for (value, thread) in &seen {
        assert_eq!(*value, Some("req-42"));
        assert!(thread.starts_with("kiln-test-worker-"), "运行于 {thread}");
    }
    assert_eq!(REQUEST.current(), None, "调用方线程从未被安装");
    assert_eq!(slot_on_worker(&pool), None, "完成后工作线程槽位应为空");
}

/// 由外部线程唤醒的恢复同样被括号包住。
#[test]
fn resumption_woken_from_foreign_thread_is_bracketed() {
    let pool = Arc::new(PoolExecutor::new(4));
    let executor = InterceptingExecutor::new(Arc::clone(&pool), &REQUEST, "req-7");
    let (tx, rx) = oneshot::channel::<u32>();

    let handle = executor.spawn(async move {
        let before = REQUEST.current();
        let payload = rx.await.expect("发送端不应被丢弃");
        (before, payload, REQUEST.current())
    });

    std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(20));
        tx.send(5).expect("接收端仍存活");
    })
    .join()
    .unwrap();

    let (before, payload, after) = block_on(handle.join()).unwrap();
    assert_eq!(before, Some("req-7"));
    assert_eq!(payload, 5);
    assert_eq!(after, Some("req-7"));
}

/// 计算以 `Err` 结束：错误原样返回，工作线程槽位被清理。
#[test]
fn failing_step_is_transported_after_cleanup() {
    let pool = Arc::new(PoolExecutor::new(1));
    let executor = InterceptingExecutor::new(Arc::clone(&pool), &REQUEST, "req-err");

    let handle = executor.spawn(async {
        yield_now().await;
        assert_eq!(REQUEST.current(), Some("req-err"));
        Err::<(), _>("upstream closed")
    });

    let outcome = block_on(handle.join()).expect("任务本身应完成");
    assert_eq!(outcome, Err("upstream closed"));
    assert_eq!(slot_on_worker(&pool), None);
}

/// 计算在恢复中 panic：调用方观测到失败，工作线程槽位依旧被清理。
#[test]
fn panicking_step_is_surfaced_and_cleaned() {
    let pool = Arc::new(PoolExecutor::new(1));
    let executor = InterceptingExecutor::new(Arc::clone(&pool), &REQUEST, "req-panic");

    let handle = executor.spawn(async {
        yield_now().await;
        if REQUEST.current() == Some("req-panic") {
            panic!("handler bug");
        }
    });

    let err = block_on(handle.join()).unwrap_err();
    assert_eq!(err, TaskError::Panicked);
    assert_eq!(slot_on_worker(&pool), None);
}

/// 挂起期间被强制取消：不会再发生恢复，因此不会再安装上下文。
#[test]
fn cancelled_while_suspended_never_resumes() {
    let pool = Arc::new(PoolExecutor::new(2));
    let executor = InterceptingExecutor::new(Arc::clone(&pool), &REQUEST, "req-cancel");
    let observed = Arc::new(Mutex::new(Vec::new()));
    let (_tx, rx) = oneshot::channel::<()>();

    let sink = Arc::clone(&observed);
    let handle = executor.spawn(async move {
        sink.lock().unwrap().push(REQUEST.current());
        let _ = rx.await;
        sink.lock().unwrap().push(REQUEST.current());
    });

    while observed.lock().unwrap().is_empty() {
        std::thread::yield_now();
    }
    handle.cancel(TaskCancellationStrategy::Forceful);
    assert!(handle.is_cancelled());
    assert_eq!(block_on(handle.join()).unwrap_err(), TaskError::Cancelled);
    assert_eq!(*observed.lock().unwrap(), vec![Some("req-cancel")]);
}

/// 对已结束的任务发出取消：既不标记取消，也不影响结果；协作式取消同样不标记。
#[test]
fn cancel_after_completion_is_not_recorded() {
    let pool = Arc::new(PoolExecutor::new(1));
    let executor = InterceptingExecutor::new(Arc::clone(&pool), &REQUEST, "req-done");

    let done = executor.spawn(async { REQUEST.current() });
    while !done.is_finished() {
        std::thread::yield_now();
    }
    done.cancel(TaskCancellationStrategy::Forceful);
    assert!(!done.is_cancelled());
    assert_eq!(block_on(done.join()), Ok(Some("req-done")));

    let (tx, rx) = oneshot::channel::<u32>();
    let waiting = executor.spawn(async move { rx.await.unwrap_or_default() });
    waiting.cancel(TaskCancellationStrategy::Cooperative);
    assert!(!waiting.is_cancelled());
    tx.send(3).unwrap();
    assert_eq!(block_on(waiting.join()), Ok(3));
}

/// 兄弟执行器共享委托，但各自绑定不同的值。
#[test]
fn rebind_shares_delegate_with_new_value() {
    let pool = Arc::new(PoolExecutor::new(2));
    let alpha = InterceptingExecutor::new(Arc::clone(&pool), &REQUEST, "alpha");
    let beta = alpha.rebind("beta");
    assert!(Arc::ptr_eq(alpha.delegate(), beta.delegate()));
    assert_eq!(*alpha.data(), "alpha");
    assert_eq!(*beta.data(), "beta");

    let a = alpha.spawn(async {
        yield_now().await;
        REQUEST.current()
    });
    let b = beta.spawn(async {
        yield_now().await;
        REQUEST.current()
    });
    assert_eq!(block_on(a.join()).unwrap(), Some("alpha"));
    assert_eq!(block_on(b.join()).unwrap(), Some("beta"));
}

/// 委托执行器派发失败时原样透传。
#[test]
fn delegate_scheduling_failure_is_surfaced_unchanged() {
    let executor = InterceptingExecutor::new(Arc::new(ClosedExecutor), &REQUEST, "req-x");
    let handle = executor.spawn(async { REQUEST.current() });
    assert_eq!(handle.id(), Some("rejected"));
    assert!(handle.is_finished());
    assert_eq!(
        block_on(handle.join()).unwrap_err(),
        TaskError::ExecutorTerminated
    );
}

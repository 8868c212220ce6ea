use std::{cell::RefCell, marker::PhantomData, thread::LocalKey};

/// 声明一个进程级的上下文槽位。
///
/// 每个工作线程各自持有一份独立的存储，初始为空。
///
/// ```rust
/// use kiln_core::context_cell;
///
/// context_cell! {
///     /// 当前请求的标识。
///     pub static REQUEST_ID: String;
/// }
///
/// assert_eq!(REQUEST_ID.current(), None);
/// {
///     let _guard = REQUEST_ID.enter("req-1".to_owned());
///     assert_eq!(REQUEST_ID.current().as_deref(), Some("req-1"));
/// }
/// assert_eq!(REQUEST_ID.current(), None);
/// ```
#[macro_export]
macro_rules! context_cell {
    ($(#[$attr:meta])* $vis:vis static $name:ident: $ty:ty;) => {
        $(#[$attr])*
        $vis static $name: $crate::context::ContextCell<$ty> = {
            ::std::thread_local! {
                static __KILN_CONTEXT_SLOT: ::core::cell::RefCell<::core::option::Option<$ty>> =
                    const { ::core::cell::RefCell::new(::core::option::Option::None) };
            }
            $crate::context::ContextCell::new(__KILN_CONTEXT_SLOT)
        };
    };
}

/// 工作线程本地的上下文槽位，任一时刻至多保存一个 `D`。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - 让恢复后的计算体无需层层传参即可读取请求级数据；
/// - 槽位只对当前线程可见，其他工作线程上的安装/清理互不影响，因此无需跨线程同步。
///
/// ## 逻辑 (How)
/// - 底层为 `thread_local!` 中的 `RefCell<Option<D>>`，槽位句柄只能以 `static` 形式存在，
///   因此所有操作都以 `&'static self` 为接收者；
/// - 所有写操作都在借用结束后才丢弃被替换出的旧值，旧值的析构逻辑即使再次访问槽位也不会冲突；
/// - 线程退出、存储已被销毁时，所有操作退化为空操作或返回 `None`。
///
/// ## 契约 (What)
/// - `install`：覆盖当前线程的槽位；
/// - `clear`：清空当前线程的槽位，已为空时同样成功；
/// - `current`/`with_current`：只读查询，不在任何括号内时返回空；
/// - `enter`：作用域获取，返回的 [`ContextGuard`] 在析构时（包括 panic 展开）清空槽位。
///
/// ## 注意事项 (Trade-offs)
/// - 括号结束后槽位总是为空，进入前残留在该线程上的值不会被恢复；
/// - `with_current` 在闭包执行期间持有共享借用；在闭包内调用 `install`/`clear` 属于用法错误，会触发 `RefCell` 的借用 panic。
pub struct ContextCell<D: 'static> {
    slot: LocalKey<RefCell<Option<D>>>,
}

impl<D: 'static> ContextCell<D> {
    /// 供 [`context_cell!`](crate::context_cell) 使用的构造入口。
    #[doc(hidden)]
    pub const fn new(slot: LocalKey<RefCell<Option<D>>>) -> Self {
        Self { slot }
    }

    /// 将 `value` 绑定到当前线程的槽位。
    pub fn install(&'static self, value: D) {
        drop(self.replace(Some(value)));
    }

    /// 清空当前线程的槽位。
    pub fn clear(&'static self) {
        drop(self.replace(None));
    }

    /// 当前线程的槽位是否已绑定值。
    pub fn is_bound(&'static self) -> bool {
        self.with_current(|value| value.is_some())
    }

    /// 以借用方式访问当前线程的绑定值。
    pub fn with_current<R>(&'static self, f: impl FnOnce(Option<&D>) -> R) -> R {
        let mut f = Some(f);
        let result = self
            .slot
            .try_with(|slot| f.take().map(|f| f(slot.borrow().as_ref())));
        match (result, f) {
            (Ok(Some(value)), _) => value,
            (_, Some(f)) => f(None),
            (_, None) => unreachable!("closure is consumed only when it ran"),
        }
    }

    /// 以作用域方式安装 `value`，守卫析构时清空槽位。
    pub fn enter(&'static self, value: D) -> ContextGuard<D> {
        self.install(value);
        ContextGuard {
            cell: self,
            _not_send: PhantomData,
        }
    }

    fn replace(&'static self, value: Option<D>) -> Option<D> {
        self.slot
            .try_with(|slot| slot.replace(value))
            .unwrap_or(None)
    }
}

impl<D: Clone + 'static> ContextCell<D> {
    /// 返回当前线程绑定值的副本。
    pub fn current(&'static self) -> Option<D> {
        self.with_current(|value| value.cloned())
    }
}

impl<D: 'static> std::fmt::Debug for ContextCell<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextCell").finish_non_exhaustive()
    }
}

/// [`ContextCell::enter`] 返回的作用域守卫。
///
/// 守卫只能在创建它的线程上析构（`!Send`），保证释放与安装发生在同一工作线程。
#[must_use = "dropping the guard immediately releases the context binding"]
pub struct ContextGuard<D: 'static> {
    cell: &'static ContextCell<D>,
    _not_send: PhantomData<*const ()>,
}

impl<D: 'static> Drop for ContextGuard<D> {
    fn drop(&mut self) {
        self.cell.clear();
    }
}

impl<D: 'static> std::fmt::Debug for ContextGuard<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextGuard").finish_non_exhaustive()
    }
}

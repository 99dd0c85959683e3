use glib::MainContext;
use once_cell::sync::Lazy;

pub static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime")
});

pub fn spawn_async<F>(fut: F)
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    RUNTIME.spawn(fut);
}

pub fn glib_channel<T: Send + 'static>() -> (glib::Sender<T>, glib::Receiver<T>) {
    MainContext::channel(glib::Priority::default())
}

pub fn run_async_to_main<T, E, Fut>(fut: Fut) -> glib::Receiver<Result<T, E>>
where
    T: Send + 'static,
    E: Send + 'static,
    Fut: std::future::Future<Output = Result<T, E>> + Send + 'static,
{
    let (tx, rx) = glib_channel::<Result<T, E>>();
    spawn_async(async move {
        let res = fut.await;
        let _ = tx.send(res);
    });
    rx
}

/// Aborts the underlying task when dropped. Windows keep the guard of
/// their in-flight fetches so closing the window cancels the request.
pub struct TaskGuard {
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Like [`run_async_to_main`], but the request dies with the returned
/// guard instead of outliving its window.
pub fn run_cancellable_to_main<T, E, Fut>(fut: Fut) -> (glib::Receiver<Result<T, E>>, TaskGuard)
where
    T: Send + 'static,
    E: Send + 'static,
    Fut: std::future::Future<Output = Result<T, E>> + Send + 'static,
{
    let (tx, rx) = glib_channel::<Result<T, E>>();
    let handle = RUNTIME.spawn(async move {
        let res = fut.await;
        let _ = tx.send(res);
    });
    (rx, TaskGuard { handle })
}

pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// ISO `YYYY-MM-DD` from the backend, `JJ/MM/AAAA` on screen. Anything
/// unparseable is shown as-is.
pub fn format_date(iso: &str) -> String {
    match chrono::NaiveDate::parse_from_str(iso.trim(), "%Y-%m-%d") {
        Ok(d) => d.format("%d/%m/%Y").to_string(),
        Err(_) => iso.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("protrans.ma"), "https://protrans.ma");
        assert_eq!(normalize_url("  http://localhost:3000 "), "http://localhost:3000");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2026-08-10"), "10/08/2026");
        assert_eq!(format_date("demain"), "demain");
    }
}

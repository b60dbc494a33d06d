use tokio::sync::mpsc;
use tokio::time::Duration;

/// Input side of a debounce stage. Values pushed here come out of the paired
/// receiver only once no newer value has arrived for the whole window.
pub struct Debouncer<T> {
    input: mpsc::Sender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn spawn(window: Duration) -> (Self, mpsc::Receiver<T>) {
        let (input, input_rx) = mpsc::channel::<T>(256);
        let (output_tx, output) = mpsc::channel::<T>(16);
        tokio::spawn(debounce_loop(input_rx, output_tx, window));
        (Self { input }, output)
    }

    pub async fn push(&self, value: T) -> bool {
        self.input.send(value).await.is_ok()
    }

    pub fn sender(&self) -> mpsc::Sender<T> {
        self.input.clone()
    }
}

async fn debounce_loop<T>(mut input: mpsc::Receiver<T>, output: mpsc::Sender<T>, window: Duration) {
    while let Some(mut latest) = input.recv().await {
        loop {
            tokio::select! {
                next = input.recv() => match next {
                    Some(value) => latest = value,
                    None => {
                        let _ = output.send(latest).await;
                        return;
                    }
                },
                _ = tokio::time::sleep(window) => {
                    if output.send(latest).await.is_err() {
                        return;
                    }
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Debouncer;
    use tokio::time::{advance, timeout, Duration, Instant};

    const WINDOW: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn burst_inside_window_emits_last_value_once() {
        let (debouncer, mut settled) = Debouncer::spawn(WINDOW);
        for text in ["n", "no", "not", "note"] {
            assert!(debouncer.push(text.to_string()).await);
            advance(Duration::from_millis(120)).await;
        }
        let last_push = Instant::now();

        assert_eq!(settled.recv().await.as_deref(), Some("note"));
        assert!(Instant::now().duration_since(last_push) >= WINDOW - Duration::from_millis(120));
        assert!(timeout(Duration::from_secs(5), settled.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn values_separated_by_quiet_periods_each_settle() {
        let (debouncer, mut settled) = Debouncer::spawn(WINDOW);
        assert!(debouncer.push("work").await);
        assert_eq!(settled.recv().await.as_deref(), Some("work"));

        assert!(debouncer.push("").await);
        assert_eq!(settled.recv().await.as_deref(), Some(""));
    }

    #[tokio::test(start_paused = true)]
    async fn closing_input_flushes_pending_value() {
        let (debouncer, mut settled) = Debouncer::spawn(WINDOW);
        let sender = debouncer.sender();
        drop(debouncer);
        sender.send(7u32).await.expect("send");
        drop(sender);
        assert_eq!(settled.recv().await, Some(7));
        assert_eq!(settled.recv().await, None);
    }
}

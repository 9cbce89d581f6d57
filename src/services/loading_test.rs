use super::*;
use tokio::time::timeout;

const TICK: Duration = Duration::from_millis(10);

#[tokio::test]
async fn ticker_starts_at_first_label() {
    let ticker = LoadingTicker::start(Duration::from_secs(60));
    assert_eq!(ticker.step(), 0);
    assert_eq!(ticker.label(), LOADING_STEPS[0]);
    assert!(ticker.is_running());
}

#[tokio::test]
async fn ticker_advances_and_wraps() {
    let ticker = LoadingTicker::start(TICK);
    let mut rx = ticker.step.clone();

    let wrapped = timeout(Duration::from_secs(5), async {
        let mut seen_last = false;
        loop {
            rx.changed().await.expect("ticker should keep publishing");
            let step = *rx.borrow();
            assert!(step < LOADING_STEPS.len());
            if step == LOADING_STEPS.len() - 1 {
                seen_last = true;
            }
            if seen_last && step == 0 {
                break;
            }
        }
    })
    .await;
    assert!(wrapped.is_ok(), "ticker never wrapped around");
}

#[tokio::test]
async fn stop_aborts_task_and_freezes_step() {
    let mut ticker = LoadingTicker::start(TICK);
    tokio::time::sleep(TICK * 3).await;
    ticker.stop();
    tokio::task::yield_now().await;
    let frozen = ticker.step();

    tokio::time::sleep(TICK * 10).await;
    assert_eq!(ticker.step(), frozen);
    assert!(!ticker.is_running());
}

#[tokio::test]
async fn drop_aborts_task() {
    let ticker = LoadingTicker::start(Duration::from_secs(60));
    let mut rx = ticker.step.clone();
    drop(ticker);

    // The sender lives in the aborted task, so the channel closes.
    let closed = timeout(Duration::from_secs(1), rx.changed())
        .await
        .expect("channel should close promptly");
    assert!(closed.is_err());
}

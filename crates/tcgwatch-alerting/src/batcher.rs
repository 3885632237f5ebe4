//! 인스턴스별 알림 배치 큐.
//!
//! critical 알림은 큐를 거치지 않고 즉시 두 채널로 나간다. 나머지는 큐에
//! 쌓였다가 주기적으로 종류별로 묶여 발송된다. 그룹의 최고 심각도가
//! critical/high면 두 채널, medium이면 채팅만, low면 로그만 남긴다.
//!
//! 큐는 이 인스턴스 안에만 존재하며 재시작 시 사라진다.

use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tcgwatch_core::models::alert::{AlertPayload, AlertQueueEntry, QueueSeverity};
use tcgwatch_core::thresholds::MonitoringConfig;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::dispatcher::{DispatchOutcome, NotificationDispatcher};

/// 그룹이 향한 채널
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// 채팅 + 이메일
    Both,
    /// 채팅만
    ChatOnly,
    /// 로그만
    LogOnly,
}

impl Delivery {
    /// 최고 심각도 → 전달 범위
    pub fn for_severity(severity: QueueSeverity) -> Self {
        match severity {
            QueueSeverity::Critical | QueueSeverity::High => Self::Both,
            QueueSeverity::Medium => Self::ChatOnly,
            QueueSeverity::Low => Self::LogOnly,
        }
    }
}

/// 그룹 하나의 처리 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub kind: String,
    pub count: usize,
    pub severity: QueueSeverity,
    pub delivery: Delivery,
    /// 로그 전용이면 None
    pub outcome: Option<DispatchOutcome>,
}

/// 제출 결과
#[derive(Debug)]
pub enum Submission {
    /// 다음 비우기까지 대기
    Queued,
    /// 즉시 발송 중인 작업
    Immediate(JoinHandle<DispatchOutcome>),
}

/// 알림 배치 큐
pub struct AlertBatcher {
    queue: Mutex<Vec<AlertQueueEntry>>,
    dispatcher: Arc<NotificationDispatcher>,
    registry: Arc<MonitoringConfig>,
}

impl AlertBatcher {
    pub fn new(dispatcher: Arc<NotificationDispatcher>, registry: Arc<MonitoringConfig>) -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
            dispatcher,
            registry,
        }
    }

    /// 대기 중인 항목 수
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// 알림 제출. critical은 즉시 발송 작업을 띄우고 나머지는 큐에 넣는다.
    /// 즉시 발송은 백그라운드에서 진행되며 호출자를 기다리게 하지 않는다.
    pub fn submit(&self, entry: AlertQueueEntry) -> Submission {
        if entry.severity == QueueSeverity::Critical {
            let mut payload = AlertPayload::new(
                self.registry.batch_route_for(&entry.kind),
                format!("[CRITICAL] {}: {}", entry.kind, entry.message),
            )
            .with_details(json!({
                "type": entry.kind,
                "metadata": entry.metadata,
                "timestamp": entry.timestamp,
            }));
            if let Some(metadata) = entry.metadata.clone() {
                payload = payload.with_metadata(metadata);
            }
            let dispatcher = self.dispatcher.clone();
            info!("critical 알림 즉시 발송: {} - {}", entry.kind, entry.message);
            return Submission::Immediate(tokio::spawn(async move {
                dispatcher.dispatch_both(&payload).await
            }));
        }

        debug!(
            "알림 큐 추가: [{}] {} - {}",
            entry.severity, entry.kind, entry.message
        );
        self.queue
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(entry);
        Submission::Queued
    }

    /// 큐를 비우고 종류별로 묶어 발송
    pub async fn flush(&self) -> Vec<BatchReport> {
        let drained: Vec<AlertQueueEntry> =
            std::mem::take(&mut *self.queue.lock().unwrap_or_else(|p| p.into_inner()));
        if drained.is_empty() {
            return Vec::new();
        }

        let mut reports = Vec::new();
        for (kind, entries) in group_by_kind(drained) {
            let severity = entries
                .iter()
                .map(|e| e.severity)
                .max()
                .unwrap_or(QueueSeverity::Low);
            let delivery = Delivery::for_severity(severity);
            let summary = batch_summary(&kind, severity, &entries);

            let outcome = match delivery {
                Delivery::LogOnly => {
                    info!("배치 알림 (로그 전용): {summary}");
                    None
                }
                Delivery::ChatOnly => Some(
                    self.dispatcher
                        .dispatch_chat_only(&self.batch_payload(&kind, severity, &entries, summary))
                        .await,
                ),
                Delivery::Both => Some(
                    self.dispatcher
                        .dispatch_both(&self.batch_payload(&kind, severity, &entries, summary))
                        .await,
                ),
            };

            reports.push(BatchReport {
                kind,
                count: entries.len(),
                severity,
                delivery,
                outcome,
            });
        }

        info!("알림 큐 비움: {}개 그룹", reports.len());
        reports
    }

    fn batch_payload(
        &self,
        kind: &str,
        severity: QueueSeverity,
        entries: &[AlertQueueEntry],
        summary: String,
    ) -> AlertPayload {
        AlertPayload::new(self.registry.batch_route_for(kind), summary).with_details(json!({
            "type": kind,
            "severity": severity,
            "count": entries.len(),
            "alerts": entries,
        }))
    }

    /// 주기적 비우기 루프
    pub async fn run(self: Arc<Self>, period: Duration, mut shutdown_rx: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(period);
        // 첫 tick은 즉시 완료되므로 건너뛴다
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.flush().await;
                }
                _ = shutdown_rx.changed() => {
                    info!("알림 배치 루프 종료 (대기 {}건 폐기)", self.pending());
                    break;
                }
            }
        }
    }
}

/// 처음 등장한 순서를 유지하며 종류별로 묶는다
fn group_by_kind(entries: Vec<AlertQueueEntry>) -> Vec<(String, Vec<AlertQueueEntry>)> {
    let mut groups: Vec<(String, Vec<AlertQueueEntry>)> = Vec::new();
    for entry in entries {
        match groups.iter_mut().find(|(kind, _)| *kind == entry.kind) {
            Some((_, group)) => group.push(entry),
            None => groups.push((entry.kind.clone(), vec![entry])),
        }
    }
    groups
}

/// `[MEDIUM] 3 performance alerts in the last minute` + 항목별 줄
fn batch_summary(kind: &str, severity: QueueSeverity, entries: &[AlertQueueEntry]) -> String {
    let mut summary = format!(
        "[{}] {} {kind} alerts in the last minute",
        severity.as_str().to_uppercase(),
        entries.len()
    );
    for entry in entries {
        summary.push_str("\n- ");
        summary.push_str(&entry.message);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::recording_dispatcher;
    use assert_matches::assert_matches;

    fn batcher() -> (
        AlertBatcher,
        Arc<crate::testing::RecordingChat>,
        Arc<crate::testing::RecordingEmail>,
    ) {
        let (dispatcher, chat, email) = recording_dispatcher();
        (
            AlertBatcher::new(dispatcher, Arc::new(MonitoringConfig::default_config())),
            chat,
            email,
        )
    }

    #[tokio::test]
    async fn medium_group_goes_to_chat_only() {
        let (batcher, chat, email) = batcher();
        batcher.submit(AlertQueueEntry::new("performance", "pageLoad lent", QueueSeverity::Medium));
        batcher.submit(AlertQueueEntry::new("performance", "cartUpdate lent", QueueSeverity::Low));

        let reports = batcher.flush().await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].severity, QueueSeverity::Medium);
        assert_eq!(reports[0].delivery, Delivery::ChatOnly);

        let posts = chat.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, "pokemon-tcg-performance");
        assert!(posts[0]
            .1
            .contains("[MEDIUM] 2 performance alerts in the last minute"));
        assert!(posts[0].1.contains("- pageLoad lent"));
        assert!(posts[0].1.contains("- cartUpdate lent"));
        assert!(email.sent().is_empty());
    }

    #[tokio::test]
    async fn high_anywhere_in_group_sends_both() {
        let (batcher, chat, email) = batcher();
        batcher.submit(AlertQueueEntry::new("error_rate", "5%", QueueSeverity::Medium));
        batcher.submit(AlertQueueEntry::new("error_rate", "12%", QueueSeverity::High));

        let reports = batcher.flush().await;
        assert_eq!(reports[0].delivery, Delivery::Both);
        assert_eq!(reports[0].count, 2);
        assert_eq!(chat.posts()[0].0, "pokemon-tcg-critical");
        assert_eq!(email.sent().len(), 1);
    }

    #[tokio::test]
    async fn low_group_only_logs() {
        let (batcher, chat, email) = batcher();
        batcher.submit(AlertQueueEntry::new("response_time", "1100ms", QueueSeverity::Low));

        let reports = batcher.flush().await;
        assert_eq!(reports[0].delivery, Delivery::LogOnly);
        assert!(reports[0].outcome.is_none());
        assert!(chat.posts().is_empty());
        assert!(email.sent().is_empty());
    }

    #[tokio::test]
    async fn groups_are_dispatched_separately() {
        let (batcher, chat, email) = batcher();
        batcher.submit(AlertQueueEntry::new("performance", "a", QueueSeverity::Medium));
        batcher.submit(AlertQueueEntry::new("error_rate", "b", QueueSeverity::High));
        batcher.submit(AlertQueueEntry::new("performance", "c", QueueSeverity::Medium));

        let reports = batcher.flush().await;
        let kinds: Vec<_> = reports.iter().map(|r| r.kind.as_str()).collect();
        assert_eq!(kinds, vec!["performance", "error_rate"]);
        assert_eq!(chat.posts().len(), 2);
        assert_eq!(email.sent().len(), 1);
        assert!(chat.posts()[0]
            .1
            .contains("[MEDIUM] 2 performance alerts in the last minute"));
    }

    #[tokio::test]
    async fn flush_empties_queue() {
        let (batcher, chat, _) = batcher();
        batcher.submit(AlertQueueEntry::new("performance", "a", QueueSeverity::Medium));
        assert_eq!(batcher.pending(), 1);

        batcher.flush().await;
        assert_eq!(batcher.pending(), 0);
        assert!(batcher.flush().await.is_empty());
        assert_eq!(chat.posts().len(), 1);
    }

    #[tokio::test]
    async fn critical_bypasses_queue() {
        let (batcher, chat, email) = batcher();
        let submission = batcher.submit(AlertQueueEntry::new(
            "error",
            "paiement échoué",
            QueueSeverity::Critical,
        ));

        assert_eq!(batcher.pending(), 0);
        let handle = assert_matches!(submission, Submission::Immediate(h) => h);
        let outcome = handle.await.unwrap();
        assert!(outcome.chat_delivered && outcome.email_delivered);

        let posts = chat.posts();
        assert_eq!(posts[0].0, "pokemon-tcg-critical");
        assert!(posts[0].1.contains("[CRITICAL] error: paiement échoué"));
        assert_eq!(email.sent().len(), 1);
    }

    #[tokio::test]
    async fn critical_metadata_fills_route_template() {
        let (batcher, chat, _) = batcher();
        let mut meta = serde_json::Map::new();
        meta.insert("metric".to_string(), json!("pageLoad"));
        meta.insert("value".to_string(), json!(5000));
        meta.insert("threshold".to_string(), json!(2000));
        let entry = AlertQueueEntry::new(
            "performance",
            "Performance dégradée détectée pour pageLoad",
            QueueSeverity::Critical,
        )
        .with_metadata(meta);

        let handle = assert_matches!(batcher.submit(entry), Submission::Immediate(h) => h);
        handle.await.unwrap();

        let posts = chat.posts();
        assert_eq!(posts[0].0, "pokemon-tcg-performance");
        assert!(posts[0].1.contains("Métrique: pageLoad"));
        assert!(posts[0].1.contains("Valeur: 5000"));
        assert!(posts[0].1.contains("Seuil: 2000"));
    }

    #[test]
    fn summary_lists_each_message() {
        let entries = vec![
            AlertQueueEntry::new("performance", "un", QueueSeverity::Medium),
            AlertQueueEntry::new("performance", "deux", QueueSeverity::Low),
        ];
        assert_eq!(
            batch_summary("performance", QueueSeverity::Medium, &entries),
            "[MEDIUM] 2 performance alerts in the last minute\n- un\n- deux"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_flushes_on_interval_and_stops() {
        let (dispatcher, chat, _) = recording_dispatcher();
        let batcher = Arc::new(AlertBatcher::new(
            dispatcher,
            Arc::new(MonitoringConfig::default_config()),
        ));
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(batcher.clone().run(Duration::from_secs(60), rx));

        batcher.submit(AlertQueueEntry::new("performance", "a", QueueSeverity::Medium));
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(batcher.pending(), 0);
        assert_eq!(chat.posts().len(), 1);

        tx.send(true).unwrap();
        task.await.unwrap();
    }
}

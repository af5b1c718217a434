//! Integration test: access logs and slow-query logs end to end

use prism_analyzer::config::{AlpConfig, AnalyzerConfig};
use prism_analyzer::httplog::{HttpLogAnalyzer, UriPatterns};
use prism_analyzer::slowlog::{SlowLogAnalyzer, SlowLogEvent, EVENT_CHANNEL_CAPACITY};
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;

const ACCESS_LOG: &str = "\
time:2024-01-01T00:00:00+00:00\thost:10.0.0.1\tmethod:GET\turi:/users/42\tstatus:200\treqtime:2.0\tvhost:api.example.com
time:2024-01-01T00:00:01+00:00\thost:10.0.0.2\tmethod:GET\turi:/users/42\tstatus:200\treqtime:0.3\tvhost:api.example.com
time:2024-01-01T00:00:02+00:00\thost:10.0.0.3\tmethod:POST\turi:/orders\tstatus:201\treqtime:1.2\tvhost:api.example.com
time:2024-01-01T00:00:03+00:00\thost:10.0.0.3\tmethod:GET\turi:/orders/9/items/3\tstatus:404\treqtime:0.01\tvhost:api.example.com
time:2024-01-01T00:00:04+00:00\thost:10.0.0.4\tmethod:GET\turi:/static/app.js\tstatus:304\treqtime:-\tvhost:cdn.example.com
";

const SLOW_LOG: &str = "\
/usr/sbin/mysqld, Version: 8.0.35 (MySQL Community Server - GPL). started with:
Tcp port: 3306  Unix socket: /var/run/mysqld/mysqld.sock
Time                 Id Command    Argument
# Time: 2024-01-01T00:00:00Z
# User@Host: app[app] @ web-1 [10.0.0.5]  Id:    11
# Query_time: 1.0  Lock_time: 0.0 Rows_sent: 1  Rows_examined: 500
use shop;
SET timestamp=1704067200;
SELECT * FROM t WHERE id=1;
# Time: 2024-01-01T00:01:00Z
# User@Host: app[app] @ web-1 [10.0.0.5]  Id:    11
# Query_time: 3.0  Lock_time: 0.1 Rows_sent: 1  Rows_examined: 700
SET timestamp=1704067260;
SELECT * FROM t WHERE id=2;
# Time: 2024-01-01T00:02:00Z
# User@Host: batch[batch] @  [10.0.0.9]  Id:    12
# Query_time: 0.2  Lock_time: 0.0 Rows_sent: 0  Rows_examined: 3
SET timestamp=1704067320;
UPDATE jobs
   SET state = 'done'
 WHERE id IN (1, 2, 3);
";

#[test]
fn test_access_log_scenario() {
    let report = HttpLogAnalyzer::new().analyze(ACCESS_LOG.as_bytes(), 1.0);

    let users = &report.endpoint_stats["/users/:id"];
    assert_eq!(users.count, 2);
    assert!((users.total_time - 2.3).abs() < 1e-9);
    assert!((users.avg_time - 1.15).abs() < 1e-9);
    assert_eq!(users.max_time, 2.0);

    assert_eq!(report.endpoint_stats["/orders/:id/items/:id"].count, 1);
    // "-" is not a number and counts as zero
    assert_eq!(report.endpoint_stats["/static/app.js"].total_time, 0.0);
    assert_eq!(report.endpoint_stats["/static/app.js"].status_codes[&304], 1);

    for stats in report.endpoint_stats.values() {
        assert_eq!(stats.avg_time, stats.total_time / stats.count as f64);
    }

    let uris: Vec<&str> = report.slow_requests.iter().map(|r| r.uri.as_str()).collect();
    assert_eq!(uris, vec!["/users/42", "/orders"]);
    assert_eq!(report.slow_requests[0].host, "api.example.com");
    assert_eq!(report.slow_requests[1].method, "POST");
}

#[test]
fn test_access_log_with_alp_config_file() {
    let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
    writeln!(file, "matching_groups:\n  - ^/users/[0-9]+$\n  - '[invalid'").unwrap();

    let config = AnalyzerConfig {
        alp_config: Some(file.path().to_path_buf()),
        ..AnalyzerConfig::default()
    };
    let analyzer = HttpLogAnalyzer::from_config(&config);
    let report = analyzer.analyze(ACCESS_LOG.as_bytes(), 1.0);

    assert!(report.config_used);
    assert_eq!(report.endpoint_stats["group_1: ^/users/[0-9]+$"].count, 2);
    assert_eq!(report.endpoint_stats["/orders"].count, 1);
}

#[test]
fn test_missing_alp_config_falls_back() {
    let config = AnalyzerConfig {
        alp_config: Some("/nonexistent/alp.yml".into()),
        ..AnalyzerConfig::default()
    };
    let report = HttpLogAnalyzer::from_config(&config).analyze(ACCESS_LOG.as_bytes(), 1.0);
    assert!(!report.config_used);
    assert!(report.endpoint_stats.contains_key("/users/:id"));
}

#[test]
fn test_explicit_patterns_json() {
    let alp = AlpConfig {
        matching_groups: vec!["^/orders".to_string()],
    };
    let json = HttpLogAnalyzer::with_patterns(UriPatterns::compile(&alp))
        .analyze_json(ACCESS_LOG.as_bytes(), 1.0)
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["endpoint_stats"]["group_1: ^/orders"]["count"], 2);
    assert_eq!(value["config_used"], true);
    assert!(value["slow_requests"].as_array().unwrap().len() <= 10);
}

#[tokio::test]
async fn test_slow_log_scenario() {
    let report = SlowLogAnalyzer::new(0.5)
        .analyze(SLOW_LOG.as_bytes().to_vec())
        .await
        .unwrap();

    assert!(!report.timed_out);
    assert_eq!(report.total_queries, 3);
    assert!((report.total_time - 4.2).abs() < 1e-9);

    let top = &report.top_query_patterns[0];
    assert_eq!(top.pattern, "select * from t where id=?");
    assert_eq!(top.count, 2);
    assert_eq!(top.max_time, 3.0);
    assert_eq!(top.min_time, 1.0);
    assert_eq!(top.rows_examined_avg, 600.0);
    assert_eq!(top.first_seen.unwrap().to_rfc3339(), "2024-01-01T00:00:00+00:00");
    assert_eq!(top.last_seen.unwrap().to_rfc3339(), "2024-01-01T00:01:00+00:00");

    let update = &report.top_query_patterns[1];
    assert_eq!(update.pattern, "update jobs set state = ? where id in(?+)");
    assert_eq!(update.example, "UPDATE jobs\n   SET state = 'done'\n WHERE id IN (1, 2, 3)");

    let slow: Vec<f64> = report.slowest_queries.iter().map(|q| q.query_time).collect();
    assert_eq!(slow, vec![3.0, 1.0]);
    assert_eq!(report.slowest_queries[0].db, "shop");
    assert_eq!(report.slowest_queries[0].lock_time, 0.1);
    assert_eq!(report.slowest_queries[0].user, "app");
    assert_eq!(report.slowest_queries[0].host, "web-1");

    for stats in &report.top_query_patterns {
        assert!(stats.min_time <= stats.max_time);
    }
}

#[tokio::test]
async fn test_slow_log_json_shape() {
    let json = SlowLogAnalyzer::new(0.5)
        .analyze_json(SLOW_LOG.as_bytes().to_vec())
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["total_queries"], 3);
    assert_eq!(value["top_query_patterns"][0]["count"], 2);
    assert_eq!(value["top_query_patterns"][0]["min_time"], 1.0);
    assert_eq!(value["slowest_queries"][0]["query"], "SELECT * FROM t WHERE id=2");
    assert!(value.get("timed_out").is_none());
}

#[tokio::test]
async fn test_stalled_producer_hits_deadline() {
    let analyzer = SlowLogAnalyzer::new(0.5).with_timeout(Duration::from_millis(100));
    let (tx, rx) = mpsc::channel::<SlowLogEvent>(EVENT_CHANNEL_CAPACITY);

    // The producer emits one event and then stalls without closing the channel
    let producer = tokio::spawn(async move {
        let mut event = SlowLogEvent {
            query: "SELECT * FROM t WHERE id=1".to_string(),
            ..Default::default()
        };
        event.time_metrics.insert("Query_time".to_string(), 1.0);
        tx.send(event).await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        drop(tx);
    });

    let started = std::time::Instant::now();
    let report = analyzer.aggregate_events(rx).await;
    assert!(started.elapsed() < Duration::from_secs(5));

    assert!(report.timed_out);
    assert_eq!(report.total_queries, 1);
    assert_eq!(report.slowest_queries.len(), 1);
    producer.abort();
}

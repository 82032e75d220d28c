use chrono::DateTime;
use rask_loki_forwarder::buffer::{Batch, FlushTrigger};
use rask_loki_forwarder::sender::{LokiSerializer, TimestampPrecision};
use rask_loki_forwarder::LogRecord;
use serde_json::{Value, json};

fn access_log_record() -> LogRecord {
    LogRecord::new("192.168.1.1 GET /index.html -> 200 (295 B)")
        .with_metadata("client", "192.168.1.1")
        .with_metadata("method", "GET")
        .with_metadata("path", "/index.html")
        .with_metadata("statuscode", "200")
        .with_metadata("size", "295")
        .with_timestamp(DateTime::UNIX_EPOCH)
}

fn encode(serializer: &LokiSerializer, records: &[LogRecord]) -> Value {
    let bytes = serializer.serialize_records(records).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[test]
fn test_access_log_stream_format() {
    let serializer = LokiSerializer::new(["path", "statuscode"], TimestampPrecision::Seconds);
    let value = encode(&serializer, &[access_log_record()]);

    assert_eq!(
        value,
        json!({
            "streams": [{
                "stream": {"path": "/index.html", "statuscode": "200"},
                "values": [[
                    "0",
                    "192.168.1.1 GET /index.html -> 200 (295 B)",
                    {"client": "192.168.1.1", "method": "GET", "size": "295"}
                ]]
            }]
        })
    );
}

#[test]
fn test_one_stream_per_record_in_submission_order() {
    let serializer = LokiSerializer::new(["app"], TimestampPrecision::Seconds);
    let records: Vec<LogRecord> = (0..7)
        .map(|i| LogRecord::new(format!("line-{i}")).with_metadata("app", "web"))
        .collect();

    let value = encode(&serializer, &records);
    let streams = value["streams"].as_array().unwrap();

    assert_eq!(streams.len(), 7);
    for (i, stream) in streams.iter().enumerate() {
        assert_eq!(stream["values"][0][1], format!("line-{i}"));
        assert_eq!(stream["values"].as_array().unwrap().len(), 1);
    }
}

#[test]
fn test_identical_labels_are_not_grouped() {
    let serializer = LokiSerializer::new(["app"], TimestampPrecision::Seconds);
    let records = vec![
        LogRecord::new("first").with_metadata("app", "api"),
        LogRecord::new("second").with_metadata("app", "api"),
    ];

    let value = encode(&serializer, &records);
    let streams = value["streams"].as_array().unwrap();

    assert_eq!(streams.len(), 2);
    assert_eq!(streams[0]["stream"], streams[1]["stream"]);
}

#[test]
fn test_missing_label_is_emitted_as_empty_string() {
    let serializer = LokiSerializer::new(["path", "statuscode"], TimestampPrecision::Seconds);
    let record = LogRecord::new("no status").with_metadata("path", "/health");

    let value = encode(&serializer, &[record]);

    assert_eq!(
        value["streams"][0]["stream"],
        json!({"path": "/health", "statuscode": ""})
    );
    assert_eq!(value["streams"][0]["values"][0][2], json!({}));
}

#[test]
fn test_label_keys_never_appear_in_remaining_metadata() {
    let serializer = LokiSerializer::new(["path", "statuscode"], TimestampPrecision::Seconds);
    let value = encode(&serializer, &[access_log_record()]);

    let remaining = value["streams"][0]["values"][0][2].as_object().unwrap();
    assert!(!remaining.contains_key("path"));
    assert!(!remaining.contains_key("statuscode"));
    assert_eq!(remaining.len(), 3);
}

#[test]
fn test_encoding_is_pure_and_leaves_records_intact() {
    let serializer = LokiSerializer::new(["path", "statuscode"], TimestampPrecision::Seconds);
    let batch = Batch::new(vec![access_log_record()], FlushTrigger::SizeBased);

    let first = serializer.serialize_batch(&batch).unwrap();
    let second = serializer.serialize_batch(&batch).unwrap();

    assert_eq!(first, second);
    assert_eq!(batch.records()[0].metadata().len(), 5);
    assert_eq!(batch.records()[0].metadata()["path"], "/index.html");
}

#[test]
fn test_timestamp_precision_on_the_wire() {
    let ts = DateTime::from_timestamp(1_700_000_000, 123_456_789).unwrap();
    let record = LogRecord::new("tick").with_timestamp(ts);

    let seconds = encode(
        &LokiSerializer::new(Vec::<String>::new(), TimestampPrecision::Seconds),
        std::slice::from_ref(&record),
    );
    let nanos = encode(
        &LokiSerializer::new(Vec::<String>::new(), TimestampPrecision::Nanoseconds),
        std::slice::from_ref(&record),
    );

    assert_eq!(seconds["streams"][0]["values"][0][0], "1700000000000000000");
    assert_eq!(nanos["streams"][0]["values"][0][0], "1700000000123456789");
}

use chrono::{TimeZone, Utc};
use op_panels::{panel_requests, Panel, PanelError, SavedVisualization};
use op_query::TimeRange;

const SAVED_VISUALIZATIONS: &str = r#"[
  {
    "id": "SMQu43wBDp0rvEg3jXMF",
    "name": "Flight Count by Origin",
    "query": "source=opensearch_dashboards_sample_data_flights | fields Carrier,Origin | stats count() by Origin",
    "type": "line",
    "timeField": "timestamp"
  },
  {
    "id": "ScQu43wBDp0rvEg34XNS",
    "title": "Delays by Carrier",
    "query": "source=opensearch_dashboards_sample_data_flights | fields Carrier,FlightDelayMin | stats sum(FlightDelayMin) as delays by Carrier",
    "type": "bar"
  }
]"#;

const PANEL: &str = r#"{
  "id": "panel-1",
  "name": "Flights",
  "dateCreated": "2021-07-01T00:00:00+00:00",
  "dateModified": "2021-07-01T00:00:00+00:00",
  "visualizations": [
    { "id": "panel_viz_ed409e13-4759-4e0f-9bc1-6ae32999318e", "savedVisualizationId": "SMQu43wBDp0rvEg3jXMF", "x": 0, "y": 0, "w": 6, "h": 4 },
    { "id": "panel_viz_f59ad102-943e-48d9-9c0a-3df7055070a3", "savedVisualizationId": "ScQu43wBDp0rvEg34XNS", "x": 0, "y": 4, "w": 6, "h": 4 },
    { "id": "panel_viz_orphan", "savedVisualizationId": "deleted", "x": 0, "y": 8, "w": 6, "h": 4 }
  ],
  "timeRange": { "from": "now/d", "to": "now/d" },
  "queryFilter": { "query": "where Carrier=&#39;OpenSearch-Air&#39;", "language": "ppl" }
}"#;

#[test]
fn every_visualization_gets_its_own_request() {
    let panel: Panel = serde_json::from_str(PANEL).expect("panel");
    let saved: Vec<SavedVisualization> = serde_json::from_str(SAVED_VISUALIZATIONS).expect("saved");
    let now = Utc.with_ymd_and_hms(2021, 7, 1, 15, 30, 0).unwrap();

    let requests = panel_requests(&panel, &saved, now);
    assert_eq!(requests.len(), 3);

    let count = requests["panel_viz_ed409e13-4759-4e0f-9bc1-6ae32999318e"]
        .as_ref()
        .expect("count request");
    assert_eq!(
        count.query,
        "source=opensearch_dashboards_sample_data_flights \
         | where timestamp >= timestamp('2021-07-01 00:00:00') and timestamp <= timestamp('2021-07-01 23:59:59') \
         | where Carrier='OpenSearch-Air' \
         | fields Carrier,Origin | stats count() by Origin"
    );

    let delays = requests["panel_viz_f59ad102-943e-48d9-9c0a-3df7055070a3"]
        .as_ref()
        .expect("delays request");
    assert!(delays.query.ends_with("| stats sum(FlightDelayMin) as delays by Carrier"));
    assert_eq!(delays.format, "viz");

    assert_eq!(
        requests["panel_viz_orphan"],
        Err(PanelError::SavedVisualizationNotFound { id: "deleted".into() })
    );
}

#[test]
fn changing_the_range_recomposes() {
    let mut panel: Panel = serde_json::from_str(PANEL).expect("panel");
    let saved: Vec<SavedVisualization> = serde_json::from_str(SAVED_VISUALIZATIONS).expect("saved");
    let now = Utc.with_ymd_and_hms(2021, 7, 1, 15, 30, 0).unwrap();

    panel.set_time_range(TimeRange::new("now-15m", "now"));
    let requests = panel_requests(&panel, &saved, now);
    let count = requests["panel_viz_ed409e13-4759-4e0f-9bc1-6ae32999318e"]
        .as_ref()
        .expect("count request");
    assert!(count
        .query
        .contains("timestamp >= timestamp('2021-07-01 15:15:00') and timestamp <= timestamp('2021-07-01 15:30:00')"));
}

//! Payload types for the equipment backend. Shapes follow the backend's
//! serializers; unknown fields are ignored on decode.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserInfo,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// One dataset as reported by the history and upload endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetSummary {
    pub id: i64,
    pub filename: String,
    pub uploaded_at: String,
    pub total_count: i64,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    pub equipment_type_distribution: BTreeMap<String, i64>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    pub count: usize,
    pub data: Vec<DatasetSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeStatistics {
    pub count: i64,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
}

/// Server-side aggregation over one dataset. All statistics are computed by
/// the backend; the client only renders them.
#[derive(Debug, Clone, Deserialize)]
pub struct Analysis {
    pub total_count: i64,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    pub min_flowrate: f64,
    pub max_flowrate: f64,
    pub min_pressure: f64,
    pub max_pressure: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub equipment_type_distribution: BTreeMap<String, i64>,
    pub statistics_by_type: BTreeMap<String, TypeStatistics>,
}

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub data: DatasetSummary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetDetail {
    pub dataset: DatasetSummary,
    pub analysis: Analysis,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_upload_response() {
        let body = r#"{
            "success": true,
            "message": "CSV file uploaded and processed successfully",
            "data": {
                "id": 7,
                "filename": "plant.csv",
                "user_username": "maria",
                "uploaded_at": "2024-05-01T10:12:03Z",
                "total_count": 3,
                "avg_flowrate": 91.7,
                "avg_pressure": 5.9,
                "avg_temperature": 103.3,
                "equipment_type_distribution": {"Pump": 2, "Valve": 1},
                "equipment_items": []
            }
        }"#;

        let response: UploadResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.data.id, 7);
        assert_eq!(response.message, "CSV file uploaded and processed successfully");
        assert_eq!(response.data.equipment_type_distribution["Pump"], 2);
    }

    #[test]
    fn decodes_history_response() {
        let body = r#"{
            "success": true,
            "count": 1,
            "data": [{
                "id": 4,
                "filename": "units.csv",
                "uploaded_at": "2024-04-28T08:00:00Z",
                "total_count": 12,
                "avg_flowrate": 104.2,
                "avg_pressure": 6.1,
                "avg_temperature": 99.0,
                "equipment_type_distribution": {"Compressor": 5, "Pump": 7}
            }]
        }"#;

        let response: HistoryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.count, 1);
        assert_eq!(response.data[0].filename, "units.csv");
        assert_eq!(response.data[0].equipment_type_distribution.len(), 2);
    }

    #[test]
    fn decodes_dataset_detail_with_analysis() {
        let body = r#"{
            "success": true,
            "dataset": {
                "id": 9,
                "filename": "site_b.csv",
                "uploaded_at": "2024-05-02T16:40:11Z",
                "total_count": 2,
                "avg_flowrate": 90.0,
                "avg_pressure": 6.0,
                "avg_temperature": 100.0,
                "equipment_type_distribution": {"Pump": 1, "Valve": 1}
            },
            "analysis": {
                "total_count": 2,
                "avg_flowrate": 90.0,
                "avg_pressure": 6.0,
                "avg_temperature": 100.0,
                "min_flowrate": 60.0,
                "max_flowrate": 120.0,
                "min_pressure": 4.0,
                "max_pressure": 8.0,
                "min_temperature": 95.0,
                "max_temperature": 105.0,
                "equipment_type_distribution": {"Pump": 1, "Valve": 1},
                "statistics_by_type": {
                    "Pump": {
                        "count": 1,
                        "avg_flowrate": 120.0,
                        "avg_pressure": 8.0,
                        "avg_temperature": 105.0
                    },
                    "Valve": {
                        "count": 1,
                        "avg_flowrate": 60.0,
                        "avg_pressure": 4.0,
                        "avg_temperature": 95.0
                    }
                }
            }
        }"#;

        let detail: DatasetDetail = serde_json::from_str(body).unwrap();
        assert_eq!(detail.dataset.id, 9);
        assert_eq!(detail.analysis.max_flowrate, 120.0);
        assert_eq!(detail.analysis.statistics_by_type["Valve"].count, 1);
    }
}

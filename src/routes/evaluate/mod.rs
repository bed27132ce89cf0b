pub mod routes;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct EvaluateParams {
    pub user_id: String,
    pub flag_name: String,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub flag_name: String,
    pub user_id: String,
    pub result: bool,
}

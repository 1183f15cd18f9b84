use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::application::use_cases::{
    GetSchemaUseCase, IngestSchemaUseCase, ingest_schema::IngestSchemaRequest,
};
use crate::presentation::http::dto::{
    ApiResponse, IngestDatabaseRequestDto, IngestDatabaseResponseDto, SchemaResponseDto,
};

pub struct SchemaHandler {
    ingest_use_case: Arc<IngestSchemaUseCase>,
    get_schema_use_case: Arc<GetSchemaUseCase>,
}

impl SchemaHandler {
    pub fn new(
        ingest_use_case: Arc<IngestSchemaUseCase>,
        get_schema_use_case: Arc<GetSchemaUseCase>,
    ) -> Self {
        Self {
            ingest_use_case,
            get_schema_use_case,
        }
    }

    pub async fn ingest_database(
        State(handler): State<Arc<SchemaHandler>>,
        Json(body): Json<IngestDatabaseRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let request = IngestSchemaRequest {
            connection_string: body.connection_string,
        };

        match handler.ingest_use_case.execute(request).await {
            Ok(response) => {
                let dto = IngestDatabaseResponseDto::from(response);
                Ok((
                    StatusCode::OK,
                    Json(ApiResponse::<IngestDatabaseResponseDto>::success(dto)),
                ))
            }
            Err(e) => Ok((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    "INGEST_FAILED".to_string(),
                    e.to_string(),
                    None,
                )),
            )),
        }
    }

    pub async fn get_schema(
        State(handler): State<Arc<SchemaHandler>>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let response = handler.get_schema_use_case.execute();
        let dto = SchemaResponseDto {
            schema: response.schema.map(|schema| (*schema).clone()),
            version: response.version,
        };

        Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
    }
}

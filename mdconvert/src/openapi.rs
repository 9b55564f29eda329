//! OpenAPI documentation, served as JSON at `/api-docs/openapi.json` and browsable at `/docs`.

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    paths(api::handlers::convert::convert_upload, api::handlers::convert::preflight),
    components(schemas(api::models::convert::ConversionOutcome)),
    tags(
        (name = "convert", description = "Convert uploaded documents to Markdown"),
    ),
    info(
        title = "mdconvert",
        description = "Upload a document and get it back as Markdown. Plain text, HTML and CSV are \
            converted in-process; PDF and Office formats need an external document converter on the server.",
    )
)]
pub struct ApiDoc;

//! OpenAPI documentation configuration
//!
//! Generates OpenAPI 3.0 specification for the Verimark API.

use utoipa::OpenApi;

use crate::handlers::{
    AnalyzeResponse, ComputeHashResponse, HealthResponse, ReadyResponse, RegistryHash,
    RegistryResponse, VerifyResponse,
};

/// Verimark API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Verimark API",
        version = "0.1.0",
        description = r#"
## Perceptual Fingerprinting and Registry Matching

Verimark detects copies of registered artwork that survived re-encoding,
light noise, rotation, mirroring or zoom-out.

- **Perceptual hash** - median denoise, 32×32 grayscale, DCT, 8×8 low-pass, median bitmask
- **Geometric variants** - the eight square symmetries, optional zoom-outs
- **Registry** - hash → owner records read live from an Algorand application

### How It Works

1. **Hash** the original via `POST /api/compute-hash` and write the hash to the registry
2. **Verify** a suspect image via `POST /api/verify`
3. Distance 0 is an *Original* match, up to the threshold a *Derivative*, above it *Clear*
4. `POST /api/analyze` shows every intermediate step of the hash
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    tags(
        (name = "Hashing", description = "Perceptual hash computation and analysis"),
        (name = "Verification", description = "Match uploads against the registry"),
        (name = "Registry", description = "Registered hashes and owners"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::hash::compute_hash_handler,
        crate::handlers::verify::verify_handler,
        crate::handlers::registry::registry_handler,
        crate::handlers::analyze::analyze_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            ComputeHashResponse,
            VerifyResponse,
            RegistryResponse,
            RegistryHash,
            AnalyzeResponse,
        )
    )
)]
pub struct ApiDoc;

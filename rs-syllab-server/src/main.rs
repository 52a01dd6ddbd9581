use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{get, middleware, post, put, web, App, HttpResponse, HttpServer, Responder};

use serde::Deserialize;
use rs_syllab_core::error::GenerationError;
use rs_syllab_core::io::{get_filename, list_files, normalize_folder};
use rs_syllab_core::model::generator::{GeneratorConfig, NameGenerator, MAX_SYLLABLES};
use rs_syllab_core::model::name::Name;

const DATA_FOLDER: &str = "./data";
const MAX_COUNT: usize = 1000;

/// Struct representing query parameters for the `/v1/generate` endpoints
#[derive(Deserialize)]
struct GenerateParams {
	syllables: Option<usize>, // -> random in the configured range if missing
	count: Option<usize>
}

#[derive(Deserialize)]
struct ConfigQuery {
	name: Option<String>
}

struct SharedData {
	generator: NameGenerator,
	config_name: String
}

impl GenerateParams {
	/// Rejects counts the generator cannot serve.
	fn check(&self) -> Result<(), String> {
		if let Some(count) = self.count {
			if !(1..=MAX_COUNT).contains(&count) {
				return Err(format!("count must be between 1 and {MAX_COUNT}, got {count}"));
			}
		}
		if let Some(syllables) = self.syllables {
			if !(1..=MAX_SYLLABLES).contains(&syllables) {
				return Err(format!("syllables must be between 1 and {MAX_SYLLABLES}, got {syllables}"));
			}
		}
		Ok(())
	}

	/// Generates one name, with an explicit syllable count if provided.
	fn generate(&self, generator: &mut NameGenerator) -> Result<Name, GenerationError> {
		match self.syllables {
			Some(n) => generator.generate(n),
			None => generator.next_name(),
		}
	}
}

/// Maps caller and configuration errors to 400, everything else to 500.
fn error_response(error: GenerationError) -> HttpResponse {
	log::warn!("Request failed: {error}");
	let bad_request = error.is_configuration_error()
		|| matches!(
			error,
			GenerationError::IndexOutOfRange { .. } | GenerationError::InvalidOperation(_)
		);

	if bad_request {
		HttpResponse::BadRequest().body(error.to_string())
	} else {
		HttpResponse::InternalServerError().body(error.to_string())
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates `count` names (default 1) and returns them newline separated.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	if let Err(message) = query.check() {
		return HttpResponse::BadRequest().body(message);
	}
	let count = query.count.unwrap_or(1);

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Generator lock failed"),
	};

	let mut names = Vec::new();
	for _ in 0..count {
		match query.generate(&mut shared_data.generator) {
			Ok(name) => names.push(name.render()),
			Err(e) => return error_response(e),
		}
	}

	HttpResponse::Ok().body(names.join("\n"))
}

/// HTTP GET endpoint `/v1/generate_structured`
///
/// Returns one name as a JSON object exposing its syllables.
#[get("/v1/generate_structured")]
async fn get_generated_structured(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	if let Err(message) = query.check() {
		return HttpResponse::BadRequest().body(message);
	}
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Generator lock failed"),
	};

	match query.generate(&mut shared_data.generator) {
		Ok(name) => HttpResponse::Ok().json(name),
		Err(e) => error_response(e),
	}
}

/// HTTP POST endpoint `/v1/vary`
///
/// Takes a JSON name and returns a variation produced by the mutator.
#[post("/v1/vary")]
async fn post_vary(data: web::Data<Mutex<SharedData>>, name: web::Json<Name>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Generator lock failed"),
	};

	match shared_data.generator.vary(&name) {
		Ok(variation) => HttpResponse::Ok().json(variation),
		Err(e) => error_response(e),
	}
}

#[get("/v1/configs")]
async fn get_configs() -> impl Responder {
	let files = match list_files(normalize_folder(DATA_FOLDER), "json") {
		Ok(files) => files,
		Err(_) => return HttpResponse::InternalServerError().body("Failed to list configurations")
	};

	let names: Vec<String> = files.iter().filter_map(|file| get_filename(file).ok()).collect();
	HttpResponse::Ok().body(names.join("\n"))
}

#[get("/v1/loaded_config")]
async fn get_loaded_config(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Generator lock failed"),
	};
	HttpResponse::Ok().body(shared_data.config_name.clone())
}

#[put("/v1/load_config")]
async fn put_config(data: web::Data<Mutex<SharedData>>, query: web::Query<ConfigQuery>) -> impl Responder {
	let name = match &query.name {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty configuration name"),
	};
	if name.contains(['/', '\\']) || name.contains("..") {
		return HttpResponse::BadRequest().body("Invalid configuration name");
	}

	// Load outside the lock, the file may need parsing
	let config_path = format!("{DATA_FOLDER}/{name}.json");
	let generator = match NameGenerator::from_file(&config_path) {
		Ok(g) => g,
		Err(e) => return HttpResponse::InternalServerError().body(format!("Failed to load configuration: {e}"))
	};

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Generator lock failed"),
	};
	shared_data.generator = generator;
	shared_data.config_name = name.to_owned();
	log::info!("Configuration '{name}' loaded");

	HttpResponse::Ok().body("Configuration loaded successfully")
}

/// Main entry point for the server.
///
/// Starts with the standard configuration, wraps the generator in a `Mutex`
/// (one random source shared by all workers) and serves the API.
///
/// # Notes
/// - The server binds to 127.0.0.1:5000.
/// - Configurations are loaded from `./data/{name}.json`.
/// - Logging is configured through `RUST_LOG` (default `info`).
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let generator = NameGenerator::new(GeneratorConfig::standard())
		.map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
	let shared_data = SharedData {
		generator,
		config_name: "standard".to_owned(),
	};
	let shared_generator = web::Data::new(Mutex::new(shared_data));

	log::info!("Listening on 127.0.0.1:5000");
	HttpServer::new(move || {
		App::new()
			.wrap(middleware::Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_generator.clone())
			.service(get_generated)
			.service(get_generated_structured)
			.service(post_vary)
			.service(get_configs)
			.service(put_config)
			.service(get_loaded_config)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}

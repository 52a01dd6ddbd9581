use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/elvish.json` + `"bin"` → `data/elvish.bin`
pub fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/elvish.json"` → `"elvish"`
/// - `"elvish.json"` → `"elvish"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists all files with a given extension in a directory, sorted by name.
///
/// Returns file names only (no paths).
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();

		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

/// Returns `true` if `cache` exists and is strictly newer than `source`.
///
/// Equal timestamps count as stale: coarse filesystem clocks cannot order
/// two writes made within the same tick. Any metadata failure counts as a
/// stale cache.
pub fn is_fresh_cache<S: AsRef<Path>, C: AsRef<Path>>(source: S, cache: C) -> bool {
	let modified = |path: &Path| fs::metadata(path).and_then(|m| m.modified()).ok();

	match (modified(source.as_ref()), modified(cache.as_ref())) {
		(Some(source), Some(cache)) => cache > source,
		_ => false,
	}
}

/// Reads a JSON document.
pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(filepath: P) -> Result<T> {
	let reader = BufReader::new(File::open(&filepath)?);
	let value = serde_json::from_reader(reader)?;
	log::info!("Loaded {}", filepath.as_ref().display());
	Ok(value)
}

/// Writes a value as pretty-printed JSON.
pub fn write_json<T: Serialize, P: AsRef<Path>>(filepath: P, value: &T) -> Result<()> {
	// Serialise before touching the file
	let json = serde_json::to_string_pretty(value)?;
	fs::write(&filepath, json)?;
	log::info!("Saved {}", filepath.as_ref().display());
	Ok(())
}

/// Encodes a value with `postcard`.
pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
	Ok(postcard::to_stdvec(value)?)
}

/// Decodes a value encoded by [`to_bytes`].
pub fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
	Ok(postcard::from_bytes(bytes)?)
}

/// Reads a `postcard` file.
pub fn read_binary<T: DeserializeOwned, P: AsRef<Path>>(filepath: P) -> Result<T> {
	let bytes = fs::read(filepath)?;
	from_bytes(&bytes)
}

/// Writes a `postcard` file.
pub fn write_binary<T: Serialize, P: AsRef<Path>>(filepath: P, value: &T) -> Result<()> {
	let bytes = to_bytes(value)?;
	fs::write(filepath, bytes)?;
	Ok(())
}

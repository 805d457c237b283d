/// Build script for watermark-remover
///
/// Compiles the C helpers that run MuPDF redaction calls under MuPDF's
/// own error handling. Symbols resolve against the libraries mupdf-sys
/// links.
fn main() {
    cc::Build::new()
        .file("src/redaction/mupdf_guard.c")
        .compile("mupdf_guard");

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/redaction/mupdf_guard.c");
}

use quote::{format_ident, quote};

/// Expands to one `#[test]` per `.lox` script below `bin/tests/scripts`,
/// each calling the given runner function with the script's contents.
#[proc_macro]
pub fn generate_tests(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let runner = syn::parse_macro_input!(input as syn::Ident);

    let root_dir = format!("{}/../scripts", env!("CARGO_MANIFEST_DIR"));
    let mut scripts: Vec<_> = walkdir::WalkDir::new(&root_dir)
        .into_iter()
        .flatten()
        .filter(|entry| entry.path().extension() == Some("lox".as_ref()))
        .map(|entry| entry.into_path())
        .collect();
    scripts.sort();

    let tests = scripts.iter().map(|path| {
        let test_file_path = path.to_string_lossy();
        let relative_test_path = path.strip_prefix(&root_dir).unwrap_or(path.as_path()).with_extension("");
        let test_ident = format_ident!(
            "test_{}",
            relative_test_path.to_string_lossy().replace(['/', '\\', '-', '.'], "_")
        );
        quote! {
            #[test]
            fn #test_ident() {
                #runner(std::fs::read_to_string(#test_file_path).unwrap().as_str());
            }
        }
    });

    quote! {
        #[ctor::ctor]
        fn init() {
            env_logger::init();
        }

        #(#tests)*
    }
    .into()
}

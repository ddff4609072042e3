//! Error types for featurebench.

/// Creates the Error, ErrorKind, ResultExt, and Result types
error_chain!{
    errors {
        ParseFormat(line: String, reason: String) {
            description("malformed benchmark result line")
            display("malformed result line '{}': {}", line, reason)
        }
        Render(what: String) {
            description("error in rendering a figure")
            display("failed to render {}", what)
        }
        Setting(path: String) {
            description("error in loading the setting")
            display("failed to load setting from {}", path)
        }
    }

    foreign_links {
        Io(::std::io::Error);
        Csv(::csv::Error);
        Toml(::toml::de::Error);
        Image(::image::ImageError);
    }
}

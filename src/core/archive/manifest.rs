use std::collections::HashMap;

/// Parse the main section of a jar manifest.
///
/// The main section ends at the first blank line. Lines starting with a
/// single space continue the previous value.
pub fn main_attributes(manifest: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    let mut current: Option<(String, String)> = None;

    for line in manifest.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            break;
        }
        if let Some(continuation) = line.strip_prefix(' ') {
            if let Some((_, value)) = current.as_mut() {
                value.push_str(continuation);
            }
            continue;
        }
        if let Some((name, value)) = current.take() {
            attributes.insert(name, value);
        }
        if let Some((name, value)) = line.split_once(':') {
            current = Some((name.trim().to_string(), value.trim_start().to_string()));
        }
    }
    if let Some((name, value)) = current {
        attributes.insert(name, value);
    }

    attributes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuation_lines_are_joined() {
        let manifest = "Manifest-Version: 1.0\nJenkins-Version: 2.0-alpha\n -SNAPSHOT\nMain-Class: Main\n";
        let attrs = main_attributes(manifest);
        assert_eq!(attrs["Jenkins-Version"], "2.0-alpha-SNAPSHOT");
        assert_eq!(attrs["Main-Class"], "Main");
    }

    #[test]
    fn per_entry_sections_are_ignored() {
        let manifest = "Manifest-Version: 1.0\r\n\r\nName: Main.class\r\nJenkins-Version: wrong\r\n";
        let attrs = main_attributes(manifest);
        assert_eq!(attrs.len(), 1);
        assert!(!attrs.contains_key("Jenkins-Version"));
    }
}

macro_rules! v1_path {
    ($path:literal) => {
        concat!("/api/v1", $path)
    };
}

/// Versioned API route definitions used by the console
pub mod v1 {
    pub const ROOT: &str = "/api/v1";
    pub const VERSION: &str = "v1";

    pub mod auth {
        pub const LOGIN: &str = v1_path!("/auth/login");
        pub const ME: &str = v1_path!("/auth/me");
    }

    pub mod runners {
        pub const COLLECTION: &str = v1_path!("/runners");
        pub const ITEM: &str = v1_path!("/runners/{id}");
        pub const EXPORT: &str = v1_path!("/runners/export");
    }

    pub mod events {
        /// Server-sent event stream carrying runner positions.
        pub const RUNNERS: &str = v1_path!("/events/runners");

        /// SSE `event:` name for location payloads on [`RUNNERS`].
        pub const RUNNER_LOCATION_EVENT: &str = "runner_location";
    }
}

/// Helper utilities for working with route templates
pub mod utils {
    /// Replace a single path parameter (e.g. `"{id}"`) with the provided value.
    pub fn replace_param(
        route: &str,
        param: &str,
        value: impl AsRef<str>,
    ) -> String {
        route.replace(param, value.as_ref())
    }

    /// Append query parameters to the provided route.
    ///
    /// Values are percent-encoded; keys are expected to be plain ASCII.
    pub fn with_query(route: &str, params: &[(&str, &str)]) -> String {
        if params.is_empty() {
            return route.to_string();
        }

        let mut path =
            String::with_capacity(route.len() + 1 + params.len() * 8);
        path.push_str(route);
        path.push('?');

        for (i, (key, value)) in params.iter().enumerate() {
            if i > 0 {
                path.push('&');
            }
            path.push_str(key);
            path.push('=');
            path.push_str(&urlencoding::encode(value));
        }

        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_route_substitutes_id() {
        assert_eq!(
            utils::replace_param(v1::runners::ITEM, "{id}", "abc"),
            "/api/v1/runners/abc"
        );
    }

    #[test]
    fn query_values_are_encoded() {
        let path = utils::with_query(
            v1::runners::COLLECTION,
            &[("page", "1"), ("search", "Tariro M&M")],
        );
        assert_eq!(path, "/api/v1/runners?page=1&search=Tariro%20M%26M");
    }

    #[test]
    fn reserved_characters_in_values_cannot_split_the_query() {
        let path = utils::with_query(
            v1::runners::COLLECTION,
            &[("search", "a=1&page=9#frag")],
        );
        assert_eq!(path, "/api/v1/runners?search=a%3D1%26page%3D9%23frag");
    }

    #[test]
    fn empty_query_leaves_route_untouched() {
        assert_eq!(
            utils::with_query(v1::runners::EXPORT, &[]),
            "/api/v1/runners/export"
        );
    }
}

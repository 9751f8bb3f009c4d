/// Clean user-supplied text using the ammonia library.
///
/// Quiz titles and descriptions come straight from a form and are rendered
/// verbatim by browser clients, so they are sanitized with a whitelist before
/// being stored. Dangerous tags (<script>, <iframe>) and event-handler
/// attributes are stripped; harmless markup is preserved.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

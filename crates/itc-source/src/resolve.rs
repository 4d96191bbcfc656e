use std::cmp::Ordering;
use std::path::Path;

use itc_core::error::PipelineError;
use itc_core::input::{InputKind, InputSpec};
use itc_core::logger::RunLogger;

/// Caractères qui font d'un token local un motif glob.
const GLOB_META: &[char] = &['*', '?', '['];

/// One expanded entry before final indexing.
struct Candidate {
    /// Position of the originating token on the command line.
    position: usize,
    token: String,
}

/// Expand, flatten and index the raw input tokens.
///
/// Remote tokens and plain paths pass through untouched, as does an existing
/// file whose name happens to contain glob metacharacters. Glob tokens expand
/// to their matches, ordered naturally (`f2` before `f10`). Argument order
/// is the primary key; the sort is stable so ties keep enumeration order.
///
/// # Errors
/// [`PipelineError::InvalidInput`] if `tokens` is empty, a glob is
/// malformed, or nothing is left after expansion.
///
/// # Example
/// ```
/// use itc_core::logger::RunLogger;
/// use itc_source::resolve::resolve_inputs;
/// let tokens = vec!["b.png".to_string(), "https://x.org/a.gif".to_string()];
/// let specs = resolve_inputs(&tokens, RunLogger::default()).unwrap();
/// assert_eq!(specs[0].index, 0);
/// assert_eq!(specs[1].token, "https://x.org/a.gif");
/// ```
pub fn resolve_inputs(tokens: &[String], log: RunLogger) -> Result<Vec<InputSpec>, PipelineError> {
    if tokens.is_empty() {
        return Err(PipelineError::invalid_input("no image path or URL given"));
    }

    let mut candidates = Vec::with_capacity(tokens.len());
    for (position, token) in tokens.iter().enumerate() {
        if InputKind::of(token) == InputKind::Local
            && token.contains(GLOB_META)
            && !Path::new(token).is_file()
        {
            let matches = expand_glob(token, log)?;
            if matches.is_empty() {
                log.warn(format!("pattern {token:?} matched nothing"));
            }
            candidates.extend(matches.into_iter().map(|token| Candidate { position, token }));
        } else {
            candidates.push(Candidate {
                position,
                token: token.clone(),
            });
        }
    }

    // Stable: equal keys keep their enumeration order.
    candidates.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| natural_cmp(&a.token, &b.token))
    });

    if candidates.is_empty() {
        return Err(PipelineError::invalid_input(
            "no input left after glob expansion",
        ));
    }

    Ok(candidates
        .into_iter()
        .enumerate()
        .map(|(index, c)| InputSpec::new(c.token, index))
        .collect())
}

fn expand_glob(pattern: &str, log: RunLogger) -> Result<Vec<String>, PipelineError> {
    let paths = glob::glob(pattern).map_err(|e| {
        PipelineError::invalid_input(format!("bad glob pattern {pattern:?}: {e}"))
    })?;
    let mut out = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => out.push(path.to_string_lossy().into_owned()),
            Ok(_) => {}
            Err(e) => {
                log.warn(format!("skipping unreadable match of {pattern:?}: {e}"));
            }
        }
    }
    Ok(out)
}

/// Ordre « naturel » : les suites de chiffres se comparent par valeur.
///
/// # Example
/// ```
/// use std::cmp::Ordering;
/// use itc_source::resolve::natural_cmp;
/// assert_eq!(natural_cmp("frame2.png", "frame10.png"), Ordering::Less);
/// assert_eq!(natural_cmp("b", "a"), Ordering::Greater);
/// ```
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut a, mut b) = (a, b);
    loop {
        match (a.chars().next(), b.chars().next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let (da, ra) = split_digits(a);
                let (db, rb) = split_digits(b);
                let (ta, tb) = (da.trim_start_matches('0'), db.trim_start_matches('0'));
                let ord = ta
                    .len()
                    .cmp(&tb.len())
                    .then_with(|| ta.cmp(tb))
                    .then_with(|| da.len().cmp(&db.len()));
                if ord != Ordering::Equal {
                    return ord;
                }
                a = ra;
                b = rb;
            }
            (Some(ca), Some(cb)) => {
                if ca != cb {
                    return ca.cmp(&cb);
                }
                a = &a[ca.len_utf8()..];
                b = &b[cb.len_utf8()..];
            }
        }
    }
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

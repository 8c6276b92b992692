use std::collections::{HashMap, HashSet};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use libtest_mimic::{Arguments, Failed, Trial};
use rand::prelude::SliceRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tts_text_align::pipeline::defaults::{RecordedNormalizer, RecordedSentence};
use tts_text_align::token_list::{extract_normalized_text, init_tokens};
use tts_text_align::{
    NormalizerConfig, PipelineItem, TagToken, TextNormalizer, TextNormalizerBuilder, Token,
};

const DEFAULT_SAMPLE_SIZE: usize = 50;
const DEFAULT_SAMPLE_SEED: u64 = 42;
const SUITE_NAME: &str = "recorded_normalizer_output_aligns_to_expected_text";

#[derive(Debug, Clone, Deserialize)]
struct ReferenceCase {
    id: String,
    text: String,
    /// Tokenizer output for tokens that were split, keyed by token index.
    #[serde(default)]
    tokenized: HashMap<usize, Vec<String>>,
    /// Indices of tokens removed by the cleaner.
    #[serde(default)]
    deleted: Vec<usize>,
    /// Token indices after which a sentence tag is inserted.
    #[serde(default)]
    sentence_breaks: Vec<usize>,
    #[serde(default)]
    tags: Vec<ReferenceTag>,
    #[serde(default)]
    config: Option<NormalizerConfig>,
    recorded: Vec<RecordedSentence>,
    #[serde(default)]
    expected: Option<String>,
    #[serde(default)]
    expected_error: Option<ExpectedError>,
}

#[derive(Debug, Clone, Deserialize)]
struct ReferenceTag {
    /// Index of the token the tag is placed in front of.
    before: usize,
    name: String,
    #[serde(default)]
    range_start: bool,
    #[serde(default)]
    range_end: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ExpectedError {
    Desynchronization,
    UnmatchedExpansion,
}

fn main() {
    let args = Arguments::from_args();

    let repo_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_mode = env_flag("TTS_ALIGN_IT_FULL");
    let sample_seed = env_u64("TTS_ALIGN_IT_SEED", DEFAULT_SAMPLE_SEED);

    let all_cases = match load_all_cases(&repo_root) {
        Ok(cases) => cases,
        Err(err) => {
            run_setup_failure(&args, err);
            return;
        }
    };
    if all_cases.is_empty() {
        run_setup_failure(
            &args,
            "No reference cases found under test-data/normalization.".to_string(),
        );
        return;
    }

    let sampled_ids = select_case_ids(&all_cases, full_mode, sample_seed);
    let mut tests = Vec::with_capacity(all_cases.len());
    for case in all_cases {
        let test_name = format!("{SUITE_NAME}::case::{}", case.id);
        let run_by_default = sampled_ids.contains(&case.id);
        let should_ignore = !run_by_default && !should_run_ignored_case(&args, &test_name);

        tests.push(
            Trial::test(test_name, move || run_reference_case(&case).map_err(Failed::from))
                .with_ignored_flag(should_ignore),
        );
    }

    libtest_mimic::run(&args, tests).exit();
}

fn run_setup_failure(args: &Arguments, message: String) {
    let test = Trial::test(format!("{SUITE_NAME}::setup"), move || {
        Err(Failed::from(message))
    });
    libtest_mimic::run(args, vec![test]).exit();
}

fn run_reference_case(case: &ReferenceCase) -> Result<(), String> {
    let config = case.config.clone().unwrap_or_default();
    let sentence_tag = config.sentence_tag.clone();
    let normalizer = build_normalizer(case, config)?;
    let items = build_items(case, &sentence_tag)?;

    let result = normalizer.normalize_token_list(&items);
    match (case.expected_error, result) {
        (Some(expected), Ok(out)) => Err(format!(
            "{}: expected {expected:?}, got '{}'",
            case.id,
            extract_normalized_text(&out, true)
        )),
        (Some(expected), Err(err)) => {
            let matches = match expected {
                ExpectedError::Desynchronization => err.is_desynchronization(),
                ExpectedError::UnmatchedExpansion => err.is_unmatched_expansion(),
            };
            if matches {
                Ok(())
            } else {
                Err(format!("{}: expected {expected:?}, got error: {err}", case.id))
            }
        }
        (None, Err(err)) => Err(format!("{}: normalize_token_list() failed: {err}", case.id)),
        (None, Ok(out)) => {
            let expected = case
                .expected
                .as_deref()
                .ok_or_else(|| {
                    format!("{}: fixture has neither expected nor expected_error", case.id)
                })?;
            let observed = extract_normalized_text(&out, true);
            if observed != expected {
                return Err(format!(
                    "{}: normalized text mismatch\n  expected: {expected}\n  observed: {observed}",
                    case.id
                ));
            }

            let parallel = normalizer
                .normalize_token_list_parallel(&items)
                .map_err(|err| format!("{}: parallel normalization failed: {err}", case.id))?;
            if parallel != out {
                return Err(format!("{}: parallel output differs from sequential", case.id));
            }
            Ok(())
        }
    }
}

fn build_normalizer(
    case: &ReferenceCase,
    config: NormalizerConfig,
) -> Result<TextNormalizer, String> {
    TextNormalizerBuilder::new(NormalizerConfig {
        worker_threads: config.worker_threads.max(2),
        ..config
    })
    .with_normalizer(Box::new(RecordedNormalizer::new(case.recorded.clone())))
    .build()
    .map_err(|err| format!("{}: failed to build TextNormalizer: {err}", case.id))
}

fn build_items(case: &ReferenceCase, sentence_tag: &str) -> Result<Vec<PipelineItem>, String> {
    let tokens = init_tokens(&case.text);
    for index in case.tokenized.keys().chain(&case.deleted).chain(&case.sentence_breaks) {
        if *index >= tokens.len() {
            return Err(format!(
                "{}: fixture refers to token {index} but the text has {} tokens",
                case.id,
                tokens.len()
            ));
        }
    }

    let mut items = Vec::with_capacity(tokens.len() + case.tags.len() + case.sentence_breaks.len());
    for token in tokens {
        let index = token.source_index;
        for tag in case.tags.iter().filter(|tag| tag.before == index) {
            let mut tag_token = TagToken::new(tag.name.clone(), index);
            tag_token.is_range_start = tag.range_start;
            tag_token.is_range_end = tag.range_end;
            items.push(tag_token.into());
        }

        let token = if case.deleted.contains(&index) {
            Token::deleted(token.surface, index, token.span)
        } else if let Some(pieces) = case.tokenized.get(&index) {
            token.with_tokenized(pieces.iter().cloned())
        } else {
            token
        };
        items.push(token.into());

        if case.sentence_breaks.contains(&index) {
            items.push(TagToken::new(sentence_tag, index).into());
        }
    }
    Ok(items)
}

fn load_all_cases(repo_root: &Path) -> Result<Vec<ReferenceCase>, String> {
    let dir = repo_root.join("test-data/normalization");
    require_path_exists(
        &dir,
        "Missing normalization fixture directory. \
         Restore test-data/normalization before running integration tests.",
    )?;
    let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)
        .map_err(|err| format!("Failed to list '{}': {err}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut all_cases = Vec::new();
    for path in paths {
        all_cases.extend(load_reference_subset(&path)?);
    }

    let mut seen = HashSet::new();
    for case in &all_cases {
        if !seen.insert(case.id.clone()) {
            return Err(format!("Duplicate fixture id '{}'", case.id));
        }
    }
    Ok(all_cases)
}

fn load_reference_subset(path: &Path) -> Result<Vec<ReferenceCase>, String> {
    let file = File::open(path)
        .map_err(|err| format!("Failed to open fixture '{}': {err}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|err| format!("Failed to parse fixture '{}': {err}", path.display()))
}

fn select_case_ids(cases: &[ReferenceCase], full_mode: bool, seed: u64) -> HashSet<String> {
    if full_mode || cases.len() <= DEFAULT_SAMPLE_SIZE {
        return cases.iter().map(|case| case.id.clone()).collect();
    }

    let mut indices: Vec<usize> = (0..cases.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    indices
        .into_iter()
        .take(DEFAULT_SAMPLE_SIZE)
        .map(|idx| cases[idx].id.clone())
        .collect()
}

fn matches_filter(args: &Arguments, test_name: &str) -> bool {
    match args.filter.as_deref() {
        None => false,
        Some(filter) if args.exact => test_name == filter,
        Some(filter) => test_name.contains(filter),
    }
}

fn should_run_ignored_case(args: &Arguments, test_name: &str) -> bool {
    if !matches_filter(args, test_name) {
        return false;
    }

    let Some(filter) = args.filter.as_deref() else {
        return false;
    };
    args.exact || filter.contains("::case::") || filter.starts_with("case::")
}

fn require_path_exists(path: &Path, hint: &str) -> Result<(), String> {
    if path.exists() {
        Ok(())
    } else {
        Err(format!("{} ({})", hint, path.display()))
    }
}

fn env_flag(name: &str) -> bool {
    match env::var(name) {
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => false,
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(value) => value.trim().parse::<u64>().unwrap_or_else(|err| {
            panic!(
                "Invalid value for {}='{}' (expected u64): {}",
                name, value, err
            )
        }),
        Err(_) => default,
    }
}

//! Genre-conditioned prompt selection.
//!
//! Every known genre tag is listed in [`GENRE_PROMPT_SETS`] together with
//! the prompt set it uses. Documentary and "other" content currently share
//! the entertainment prompts; adding a dedicated set for them means adding
//! a [`PromptSet`] variant and changing their rows in the table.
//!
//! Tags missing from the table use [`DEFAULT_PROMPT_SET`].

use serde_json::Value;

use crate::schema::response_schema;
use crate::task::GenerationTask;

/// A family of prompts tuned for one kind of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptSet {
    Sports,
    Entertainment,
}

/// Genre tag → prompt set.
pub const GENRE_PROMPT_SETS: &[(&str, PromptSet)] = &[
    ("sports", PromptSet::Sports),
    ("entertainment", PromptSet::Entertainment),
    ("documentary", PromptSet::Entertainment),
    ("other", PromptSet::Entertainment),
];

/// Prompt set for tags that are not in [`GENRE_PROMPT_SETS`].
pub const DEFAULT_PROMPT_SET: PromptSet = PromptSet::Entertainment;

/// Everything a task runner needs to build one generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskPrompt {
    pub system_instruction: &'static str,
    pub prompt: &'static str,
    pub response_schema: Value,
}

/// Looks up the prompt set for a genre tag. Lookup is exact.
pub fn prompt_set_for(genre: &str) -> PromptSet {
    GENRE_PROMPT_SETS
        .iter()
        .find(|(tag, _)| *tag == genre)
        .map(|(_, set)| *set)
        .unwrap_or(DEFAULT_PROMPT_SET)
}

/// Selects the `(system instruction, prompt, schema)` triple for a task.
pub fn select(task: GenerationTask, genre: &str) -> TaskPrompt {
    let (system_instruction, prompt) = texts(task, prompt_set_for(genre));
    TaskPrompt {
        system_instruction,
        prompt,
        response_schema: response_schema(task),
    }
}

fn texts(task: GenerationTask, set: PromptSet) -> (&'static str, &'static str) {
    use GenerationTask::*;
    match (set, task) {
        (PromptSet::Entertainment, Summary) => (ENTERTAINMENT_SUMMARY_SYSTEM, ENTERTAINMENT_SUMMARY),
        (PromptSet::Entertainment, KeySections) => {
            (ENTERTAINMENT_SECTIONS_SYSTEM, ENTERTAINMENT_SECTIONS)
        }
        (PromptSet::Entertainment, Categorization) => {
            (ENTERTAINMENT_CATEGORIZATION_SYSTEM, ENTERTAINMENT_CATEGORIZATION)
        }
        (PromptSet::Sports, Summary) => (SPORTS_SUMMARY_SYSTEM, SPORTS_SUMMARY),
        (PromptSet::Sports, KeySections) => (SPORTS_SECTIONS_SYSTEM, SPORTS_SECTIONS),
        (PromptSet::Sports, Categorization) => {
            (SPORTS_CATEGORIZATION_SYSTEM, SPORTS_CATEGORIZATION)
        }
    }
}

/// Prompt used by the genre classifier. The answer must be a bare tag.
pub const CLASSIFICATION_PROMPT: &str = r#"Classify this video into exactly one category based on its content format:

- "sports": footage of a real sporting event (match, game, race, tournament, athletics meet) with real athletes competing.
- "entertainment": scripted or produced content such as movies, series, music videos, talk shows and reality TV. A scripted film about a sport is still "entertainment".
- "documentary": non-fiction long-form content such as documentaries, docuseries, educational films and investigative journalism.
- "other": anything else, for example tutorials, vlogs, presentations and user-generated clips.

Respond with only the category name."#;

// ── Entertainment ──────────────────────────────────────────────────────

const ENTERTAINMENT_SUMMARY_SYSTEM: &str = "You are an experienced video analyst with a deep understanding of film and television. \
Analyze the provided video and extract its key information.";

const ENTERTAINMENT_SUMMARY: &str = "Analyze this video and provide summary, itemized_summary and subject_topics. \
Do not add any comment or text outside the requested structure.";

const ENTERTAINMENT_SECTIONS_SYSTEM: &str = "You are an experienced video analyst who can identify the key moments of a video. \
For every clip you find, classify the type of moment and give precise start and end timecodes.";

const ENTERTAINMENT_SECTIONS: &str = "List every notable clip in this video with its type, start and end timecodes, \
a short summary, and the reason it was selected. Do not cut dialogue or audio mid-sentence. \
Make sure the timecodes are accurate. Do not add any comment or text outside the requested structure.";

const ENTERTAINMENT_CATEGORIZATION_SYSTEM: &str = "You are an experienced video analyst. \
Categorize the title shown in the provided video in detail.";

const ENTERTAINMENT_CATEGORIZATION: &str = "Create a detailed categorization of this movie or series title using these categories:

character: roles of the people in the story, such as victims, suspects, investigators and witnesses.
concept: the core idea of the story and whether it is original or adapted.
scenario: the main plot points, the central problem, and genre elements such as mystery or intrigue.
setting: the time period and locations, both the general environment and specific places.
subject: the primary topics, such as the type of crime or lifestyle depicted.
practice: procedural or professional elements, such as legal or investigative processes.
theme: abstract ideas explored, such as justice, morality and conflict.
video_mood: the intended emotional tone, such as suspenseful, chilling or uplifting.

Use single words for each item. Avoid verbose descriptions.";

// ── Sports ─────────────────────────────────────────────────────────────

const SPORTS_SUMMARY_SYSTEM: &str = "You are a sports broadcast analyst and metadata expert with knowledge of all major sports. \
Analyze the provided sports video and extract key information about the match or event.";

const SPORTS_SUMMARY: &str = "Analyze this sports video and provide:
- summary: teams or athletes, final score or result, venue, and key turning points.
- itemized_summary: key events in chronological order (scores, penalties, substitutions, injuries, milestones).
- subject_topics: the sport, competition, teams, and storylines such as comeback, upset or rivalry.

Identify players, coaches, officials and commentators from both picture and commentary. \
Do not add any comment or text outside the requested structure.";

const SPORTS_SECTIONS_SYSTEM: &str = "You are a sports broadcast analyst who pinpoints the key moments of a match: \
scores, saves, fouls, penalties, highlight plays, celebrations and turning points. \
Extract every significant event with precise timecodes.";

const SPORTS_SECTIONS: &str = "List every significant event in this sports video with its type, start and end timecodes, \
a short summary, and why it matters to the result. Do not cut commentary mid-sentence. \
Make sure the timecodes are accurate. Do not add any comment or text outside the requested structure.";

const SPORTS_CATEGORIZATION_SYSTEM: &str = "You are a sports content analyst with knowledge of competitions, teams and athletes. \
Categorize the sporting event shown in the provided video in detail.";

const SPORTS_CATEGORIZATION: &str = "Create a detailed categorization of this sporting event using these categories:

character: players, coaches, officials and commentators, with team or position where visible.
concept: the type of event, such as league match, final, qualifier or exhibition.
scenario: the match narrative, momentum shifts, and how the result was decided.
setting: venue, city, conditions, crowd atmosphere, day or night.
subject: the sport, competition, round, and participants.
practice: tactics, formations, set pieces and technical skills on display.
theme: competition, rivalry, teamwork, resilience, dominance and similar ideas.
video_mood: the emotional tone, such as tense, dramatic, celebratory or one-sided.

Use single words for each item. Avoid verbose descriptions.";

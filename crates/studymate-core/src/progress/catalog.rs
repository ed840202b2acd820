//! Badge catalog
//!
//! The fixed, ordered list of every badge. Order matters: unlocks found in the
//! same scan are appended in catalog order.

use std::sync::LazyLock;

use super::badges::BadgeRule::{self, *};
use super::badges::BadgeDefinition;
use super::badges::CalendarCondition::*;
use super::badges::CompositeCondition::*;
use super::state::{ActionKind, FEATURE_FLASHCARDS, FEATURE_QUIZ, FEATURE_SUMMARY};

const FIVE_MB: u64 = 5 * 1024 * 1024;

const AI_FEATURES: &[&str] = &[FEATURE_QUIZ, FEATURE_FLASHCARDS, FEATURE_SUMMARY];

fn badge(
    id: &'static str,
    name: &'static str,
    icon: &'static str,
    description: &'static str,
    rule: BadgeRule,
) -> BadgeDefinition {
    BadgeDefinition {
        id,
        name,
        icon,
        description,
        rule,
        secret: false,
    }
}

fn action(kind: ActionKind, count: u32) -> BadgeRule {
    ActionThreshold { kind, count }
}

impl BadgeDefinition {
    fn secret(mut self) -> Self {
        self.secret = true;
        self
    }
}

static CATALOG: LazyLock<Vec<BadgeDefinition>> = LazyLock::new(|| {
    vec![
        // Notes, quizzes, decks
        badge("first-note", "Note Taker", "✍️", "Create your first note", action(ActionKind::CreateNote, 1)),
        badge("five-notes", "Scribe", "📜", "Create 5 notes", action(ActionKind::CreateNote, 5)),
        badge("first-quiz", "Quiz Whiz", "🧠", "Generate your first quiz", action(ActionKind::GenerateQuiz, 1)),
        badge("five-quizzes", "Mastermind", "🏆", "Generate 5 quizzes", action(ActionKind::GenerateQuiz, 5)),
        badge("first-deck", "Card Shark", "🃏", "Create a flashcard deck", action(ActionKind::CreateFlashcardDeck, 1)),
        badge("level-2", "Level 2 Learner", "🚀", "Reach 100 XP", XpThreshold(100)),
        badge("level-5", "Power Learner", "⚡", "Reach 500 XP", XpThreshold(500)),
        badge("streak-3", "On a Roll", "🔥", "Maintain a 3-day streak", StreakThreshold(3)),
        badge("ten-notes", "Archivist", "📚", "Create 10 notes", action(ActionKind::CreateNote, 10)),
        badge("twenty-five-notes", "Loremaster", "🧙", "Create 25 notes", action(ActionKind::CreateNote, 25)),
        badge("fifty-notes", "Grand Historian", "🏛️", "Create 50 notes", action(ActionKind::CreateNote, 50)),
        badge("first-summary", "Summarizer", "📝", "Summarize a note for the first time", action(ActionKind::CreateNote, 2)).secret(),
        badge("ten-quizzes", "Quiz Champion", "🏅", "Generate 10 quizzes", action(ActionKind::GenerateQuiz, 10)),
        badge("twenty-five-quizzes", "Quiz Legend", "👑", "Generate 25 quizzes", action(ActionKind::GenerateQuiz, 25)),
        badge("hard-quiz", "Challenge Seeker", "🧗", "Generate a quiz on hard difficulty", Composite(HardQuizToday)).secret(),
        badge("five-decks", "Deck Builder", "🏗️", "Create 5 flashcard decks", action(ActionKind::CreateFlashcardDeck, 5)),
        badge("ten-decks", "Deck Master", "🧙‍♂️", "Create 10 flashcard decks", action(ActionKind::CreateFlashcardDeck, 10)),
        // Levels
        badge("level-10", "Scholar", "🧑‍🏫", "Reach Level 10 (1000 XP)", XpThreshold(1000)),
        badge("level-15", "Prodigy", "🧑‍🔬", "Reach Level 15 (1500 XP)", XpThreshold(1500)),
        badge("level-20", "Sage", "🧘", "Reach Level 20 (2000 XP)", XpThreshold(2000)),
        badge("level-25", "Enlightened", "💡", "Reach Level 25 (2500 XP)", XpThreshold(2500)),
        badge("level-30", "Ascended", "✨", "Reach Level 30 (3000 XP)", XpThreshold(3000)),
        badge("level-40", "Genius", "🧠", "Reach Level 40 (4000 XP)", XpThreshold(4000)),
        badge("level-50", "Brainiac", "🤖", "Reach Level 50 (5000 XP)", XpThreshold(5000)),
        // Streaks
        badge("streak-7", "Week-Long Warrior", "⚔️", "Maintain a 7-day streak", StreakThreshold(7)),
        badge("streak-14", "Fortnightly Fighter", "🛡️", "Maintain a 14-day streak", StreakThreshold(14)),
        badge("streak-30", "Month of Mastery", "🗓️", "Maintain a 30-day streak", StreakThreshold(30)),
        badge("streak-60", "Two-Month Titan", "💪", "Maintain a 60-day streak", StreakThreshold(60)),
        badge("streak-90", "Quarterly Quest", "🗺️", "Maintain a 90-day streak", StreakThreshold(90)),
        // Exams
        badge("first-exam", "Test Taker", "✍️", "Try the Exam Simulator for the first time", action(ActionKind::TakeExam, 1)),
        badge("five-exams", "Examiner", "🧐", "Complete 5 exams", action(ActionKind::TakeExam, 5)),
        badge("ten-exams", "Proctor", "👨‍🏫", "Complete 10 exams", action(ActionKind::TakeExam, 10)),
        // Habits and milestones
        badge("night-owl", "Night Owl", "🦉", "Study late at night (after 10 PM)", Calendar(HourWindow { from: 22, to: 2 })).secret(),
        badge("early-bird", "Early Bird", "🐦", "Study early in the morning (before 7 AM)", Calendar(HourWindow { from: 5, to: 7 })).secret(),
        badge("all-features", "Explorer", "🧭", "Use every main feature at least once", Composite(DistinctFeaturesToday(4))),
        badge("weekend-warrior", "Weekend Warrior", "🏕️", "Study on a Saturday or Sunday", Calendar(Weekend)).secret(),
        badge("perfect-score", "Perfectionist", "💯", "Get a 100% score on a quiz or exam", Composite(PerfectScores(1))).secret(),
        badge("heavy-lifter", "Heavy Lifter", "🏋️", "Upload a large file (> 5MB)", Composite(LargestFile(FIVE_MB + 1))).secret(),
        badge("speed-reader", "Speed Reader", "⏩", "Generate a summary for a long note", Composite(WordsWritten(10_001))).secret(),
        badge("hat-trick", "Hat Trick", "🎩", "Use 3 different features in one day", Composite(DistinctFeaturesToday(3))),
        badge("curious-mind", "Curious Mind", "🤔", "Generate a quiz on a non-academic topic", Reserved).secret(),
        badge("librarian", "Librarian", "🗂️", "Create 3 flashcard decks in a single day", Composite(DecksToday(3))),
        badge("knowledge-builder", "Knowledge Builder", "🧱", "Add 1000 XP in a single week", Composite(WeeklyXp(1000))),
        badge("focused-learner", "Focused Learner", "🎯", "Spend over an hour in exam mode", Composite(LongestExamSession(61))).secret(),
        badge("dedication", "Dedication", "🙏", "Log in every day for a month", Composite(TotalDaysUsed(30))),
        badge("polymath", "Polymath", "🌍", "Generate quizzes on 5 different topics", Composite(DistinctTopics(5))),
        badge("quick-learner", "Quick Learner", "⚡️", "Reach Level 3 in your first day", Composite(FirstDayXp(200))),
        badge("note-organizer", "Note Organizer", "🗄️", "Have notes with at least 5 different titles", Composite(DistinctTopics(5))),
        badge("study-marathon", "Study Marathon", "🏃‍♂️", "Generate more than 5 items (quizzes/decks) in a day", Composite(ItemsToday(6))),
        badge("ai-collaborator", "AI Collaborator", "🤝", "Use every AI feature (quiz, flashcards, summary)", Composite(RequiredFeaturesToday(AI_FEATURES))),
        badge("streak-saver", "Streak Saver", "🆘", "Log in on the last day of the week to save a streak", AllOf(vec![Calendar(Weekday(chrono::Weekday::Sun)), StreakThreshold(2)])).secret(),
        badge("badge-hunter", "Badge Hunter", "🏹", "Unlock 10 badges", BadgeCountThreshold(10)),
        badge("badge-collector", "Badge Collector", "🎖️", "Unlock 25 badges", BadgeCountThreshold(25)),
        badge("badge-master", "Badge Master", "🏅", "Unlock 50 badges", BadgeCountThreshold(50)),
        badge("unstoppable", "Unstoppable", "🚀", "Maintain a 365-day streak", StreakThreshold(365)),
        badge("true-fan", "True Fan", "❤️", "Use the app for 100 days", Composite(TotalDaysUsed(100))),
        badge("veteran", "Veteran", "👴", "One year anniversary of using the app", Calendar(DaysSinceFirstUse(365))).secret(),
        badge("new-year", "New Year, New Knowledge", "🎉", "Log in on January 1st", Calendar(DayOfYear { month: 1, day: 1 })).secret(),
        // Secrets
        badge("secret-1", "The Konami Code", "👾", "You found a classic!", Composite(EasterEgg)).secret(),
        badge("secret-2", "404", "❓", "Badge not found... or is it?", Composite(PageNotFound)).secret(),
        badge("secret-3", "Time Traveler", "⏳", "Someone likes to mess with the clock.", Composite(ClockSkew)).secret(),
        badge("secret-4", "Button Masher", "💥", "You clicked a button 20 times in 10 seconds.", Composite(RapidInputBurst(20))).secret(),
        badge("secret-5", "Hidden Gem", "💎", "You found a hidden feature.", Composite(HiddenFeature)).secret(),
        badge("secret-6", "Full House", "🏠", "You have 5 decks with 25+ cards each.", action(ActionKind::CreateFlashcardDeck, 5)).secret(),
        badge("secret-7", "The Phoenix", "🔥", "You revived a streak after losing it.", Composite(RevivedStreak)).secret(),
        badge("secret-8", "The Completionist", "✅", "You have used every feature in the app.", Composite(AllFeaturesEver)).secret(),
        badge("secret-9", "The Architect", "🏛️", "You created a note with over 10,000 words.", Composite(WordsWritten(10_000))).secret(),
        badge("secret-10", "The Social Butterfly", "🦋", "You shared your results (future feature).", Reserved).secret(),
        badge("secret-11", "The Validator", "✔️", "You reported a bug (future feature).", Reserved).secret(),
        badge("secret-12", "The Philanthropist", "💖", "You donated to the project (future feature).", Reserved).secret(),
        badge("secret-13", "The Beta Tester", "🧪", "You were part of the beta program.", Reserved).secret(),
        badge("secret-14", "The First Follower", "🥇", "You were one of the first 100 users.", Reserved).secret(),
        badge("secret-15", "The Trendsetter", "📈", "You suggested a feature that got implemented.", Reserved).secret(),
        badge("secret-16", "The Minimalist", "🧘‍♀️", "You only used one feature for a whole week.", Composite(SingleFeatureWeek)).secret(),
        badge("secret-17", "The Maximalist", "🎉", "You used all features in a single day.", Composite(AllFeaturesToday)).secret(),
        badge("secret-18", "The Insomniac", "☕", "You were active on the app for 6 hours straight.", Composite(LongestSession(360))).secret(),
        badge("secret-19", "The Challenger", "💪", "You took 5 hard quizzes in a row.", Composite(HardQuizRun(5))).secret(),
        badge("secret-20", "The One and Only", "🦄", "This badge is unique to you.", Reserved).secret(),
    ]
});

/// Every badge in unlock-scan order.
pub fn catalog() -> &'static [BadgeDefinition] {
    &CATALOG
}

/// Look up a badge by id.
pub fn find_badge(id: &str) -> Option<&'static BadgeDefinition> {
    CATALOG.iter().find(|badge| badge.id == id)
}

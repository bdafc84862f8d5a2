use crate::history::HistoryBuffer;
use crate::knowledge::KnowledgeGateway;
use strum::{Display, EnumString};

const GREETING: &str = "heyy i'm spark\n\
here to help u get stuff done\n\
/startup /focus /schedule - plan the day\n\
/checkin /midcheck - see how it's going\n\
/wrapup - close out the day\n\
/clear - fresh start\n\
/access - what i can read and write\n\
or just msg me";

/// `/name` or `/name@botname` as the first word, without the slash.
fn command_name(text: &str) -> Option<&str> {
    let first = text.split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    Some(name.split('@').next().unwrap_or(name))
}

/// Slash commands answered at the inbound boundary, without the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Command {
    Start,
    Clear,
    Access,
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        command_name(text)?.parse().ok()
    }

    pub fn execute(self, history: &HistoryBuffer, gateway: &KnowledgeGateway) -> String {
        match self {
            Self::Start => GREETING.to_string(),
            Self::Clear => {
                let cleared = history.clear();
                tracing::info!(cleared, "Conversation history cleared");
                format!("cleared {cleared} msgs, fresh start")
            }
            Self::Access => gateway.access_summary(),
        }
    }
}

/// Structured session commands. Each becomes an ordinary conversation turn
/// whose user text is the command's canned prompt, so it runs through the
/// tool loop with full knowledge access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SessionCommand {
    Startup,
    Midcheck,
    Wrapup,
    Focus,
    Schedule,
    Checkin,
}

impl SessionCommand {
    pub fn parse(text: &str) -> Option<Self> {
        command_name(text)?.parse().ok()
    }

    pub fn prompt(self) -> &'static str {
        match self {
            Self::Startup => STARTUP,
            Self::Midcheck => MIDCHECK,
            Self::Wrapup => WRAPUP,
            Self::Focus => FOCUS,
            Self::Schedule => SCHEDULE,
            Self::Checkin => CHECKIN,
        }
    }
}

const STARTUP: &str = "Session startup.

1. Use the context you already have: the user profile, now.md (active topics) and the most recent daily file.
2. Summarize in 3-5 short bullets: today's likely priorities, open threads worth continuing, the current focus or mood.
3. Ask what they want to focus on today.

Keep it short.";

const MIDCHECK: &str = "Mid-session check.

1. Recall the focus set earlier today. Read today's daily file if there is one.
2. Ask how it's going, whether there's progress on that focus, and whether anything is blocking.
3. Depending on the answer, offer to log progress to the daily file, adjust the focus, or suggest a break after a long stretch.

Casual and brief.";

const WRAPUP: &str = "Session wrapup.

1. Read today's daily file. What got done, what is still open?
2. Ask what went well and what should carry over to tomorrow.
3. Append a wrapup section with a short summary and any insights to today's daily file.
4. Ask for any early thoughts on tomorrow's focus.

Concise but meaningful.";

const FOCUS: &str = "Set today's focus.

1. Look at now.md (active topics), work.md (current tasks) if readable, and yesterday's daily file.
2. Ask for the ONE thing to focus on today.
3. Once decided, write the focus to today's daily file and offer a concrete first step.

One focus, one next step.";

const SCHEDULE: &str = "Plan today's schedule.

1. Check the current time with get_current_time.
2. Ask what they want to get done today.
3. Build a realistic plan: deep work blocks of 90-120 minutes, 15 minute breaks between them, a lunch break, buffer time. Front-load the important work and leave the afternoon for meetings and admin.
4. Write it to today's daily file (memory/timeline/daily/YYYY-MM-DD.md) in this shape:

## Schedule

- [ ] 09:00 - 10:30 | Task description
- [ ] 10:30 - 10:45 | Break
- [ ] 10:45 - 12:00 | Task description

## Check-ins

5. Confirm the plan and ask whether anything needs adjusting.";

const CHECKIN: &str = "Quick progress check-in.

1. Get the current time and today's schedule from the daily file.
2. Ask how it's going and whether anything is blocking.
3. If a block is done, tick it off and celebrate briefly. If they're stuck, offer specific help. If they need more time, suggest adjusting the schedule.
4. Log the check-in under ## Check-ins in today's daily file as `HH:MM | what they said`.
5. Point at what's next on the schedule.

Brief and supportive.";

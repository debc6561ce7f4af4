//! Command Dispatcher: the call boundary between oracle decisions and task
//! entry points.

use blockhand_types::{ActionRequest, CommandSource, Decision, WEB_SPEAKER};
use blockhand_world::WorldGateway;
use tracing::{debug, info};

use crate::agent::Agent;

impl<W: WorldGateway> Agent<W> {
    /// Say or do what the oracle decided.
    pub async fn handle_decision(&self, decision: Decision, speaker: &str, source: CommandSource) {
        match decision {
            Decision::Narration { text } => self.say(&text),
            Decision::Action { request, narration } => {
                if let Some(line) = narration.filter(|l| !l.trim().is_empty()) {
                    self.say(&line);
                }
                self.dispatch(request, speaker, source).await;
            }
        }
    }

    /// Run the task entry point for `request` on behalf of `speaker`.
    ///
    /// Long tasks (mining, building, transfers) are awaited to completion;
    /// follow and combat return once started.
    pub async fn dispatch(&self, request: ActionRequest, speaker: &str, source: CommandSource) {
        info!(action = %request.name(), speaker, ?source, "dispatching");
        match request {
            ActionRequest::MineBlock {
                block_name,
                quantity,
            } => {
                self.mine(&block_name, quantity.unwrap_or(1)).await;
            }
            ActionRequest::GiveItems {
                item_name,
                quantity,
            } => {
                self.give(speaker, &item_name, quantity).await;
            }
            ActionRequest::FollowPlayer { username } => {
                let target = username
                    .filter(|u| !u.trim().is_empty())
                    .unwrap_or_else(|| self.follow_target(speaker, source));
                self.follow(&target);
            }
            ActionRequest::BuildHouse {} => {
                self.build_house().await;
            }
            ActionRequest::KillMobs { mob_name } => {
                let filter = mob_name.filter(|m| !m.trim().is_empty());
                self.start_combat(filter);
            }
            ActionRequest::StopAll {} => self.stop_all(),
            ActionRequest::StopFollow {} => self.stop_follow(),
            ActionRequest::ReportStatus {} => {
                self.report_status();
            }
            ActionRequest::StashItems {} => {
                self.stash().await;
            }
        }
    }

    /// Who "follow me" means: the speaker in world chat; from the web, the
    /// last player heard in chat, else the web user.
    fn follow_target(&self, speaker: &str, source: CommandSource) -> String {
        match source {
            CommandSource::World => speaker.to_owned(),
            CommandSource::Web => {
                let last = self.state().last_interacted().map(str::to_owned);
                debug!(?last, "web follow request");
                last.unwrap_or_else(|| WEB_SPEAKER.to_owned())
            }
        }
    }
}

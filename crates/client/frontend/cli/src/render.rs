//! Plain-text rendering of the view model.
//!
//! Every function returns lines instead of printing so the output can be
//! checked in tests.

use runtime::{AlertState, BATTLEGROUNDS, BattleView, PlayerCard, Route};

use client_frontend_core::{BattleSummary, MessageLevel, ViewModel};

pub fn alert_line(alert: &AlertState) -> String {
    format!("[{}] {}", alert.kind, alert.message)
}

pub fn route_line(route: &Route) -> String {
    let label = match route {
        Route::Onboarding => "onboarding".to_string(),
        Route::Home => "registration".to_string(),
        Route::CreateBattle => "create a battle".to_string(),
        Route::JoinBattle => "join a battle".to_string(),
        Route::Battle(name) => format!("battle {name}"),
        Route::Battleground => "battleground".to_string(),
    };
    format!("-> {label} ({})", route.path())
}

pub fn status_lines(vm: &ViewModel, message_limit: usize) -> Vec<String> {
    let session = &vm.session;
    let mut lines = Vec::new();

    let identity = session
        .identity
        .as_ref()
        .map(|address| address.short())
        .unwrap_or_else(|| "none".to_string());
    lines.push(format!("account:     {identity}"));

    if session.step.is_ready() {
        lines.push(format!(
            "connection:  {}",
            if session.connected {
                "connected"
            } else {
                "connecting"
            }
        ));
    } else {
        lines.push(format!(
            "onboarding:  step {} - {}",
            session.step.code(),
            session.step.instructions()
        ));
    }

    lines.push(format!(
        "player:      {}{}",
        if session.registered {
            "registered"
        } else {
            "not registered"
        },
        if session.token_minted { ", token minted" } else { "" }
    ));
    lines.push(format!("ground:      {}", session.battleground));
    lines.push(format!("screen:      {}", vm.route.path()));

    match &vm.active {
        Some(active) => lines.push(format!("battle:      {}", summary_line(active))),
        None if session.awaiting_opponent => {
            lines.push("battle:      waiting for an opponent".to_string())
        }
        None => {}
    }
    lines.push(format!(
        "players:     {} registered, {} open battles",
        vm.registered_players,
        vm.lobby.len()
    ));

    let mut recent: Vec<_> = vm.messages().recent(message_limit).collect();
    recent.reverse();
    for entry in recent {
        let marker = match entry.level {
            MessageLevel::Info => ' ',
            MessageLevel::Success => '+',
            MessageLevel::Error => '!',
        };
        lines.push(format!("  {marker} {}", entry.text));
    }

    lines
}

pub fn lobby_lines(vm: &ViewModel) -> Vec<String> {
    if vm.lobby.is_empty() {
        return vec!["no battles to join, create one".to_string()];
    }
    vm.lobby.iter().map(summary_line).collect()
}

fn summary_line(battle: &BattleSummary) -> String {
    match &battle.opponent {
        Some(opponent) => format!(
            "{} ({:?}): {} vs {}",
            battle.name,
            battle.status,
            battle.creator.short(),
            opponent.short()
        ),
        None => format!(
            "{} ({:?}): created by {}",
            battle.name,
            battle.status,
            battle.creator.short()
        ),
    }
}

pub fn vitals_lines(view: &BattleView) -> Vec<String> {
    let mut lines = vec![format!("battle {}", view.battle.name), card_line("you", &view.local)];
    match &view.opponent {
        Some(opponent) => lines.push(card_line("opponent", opponent)),
        None => lines.push("opponent: not joined yet".to_string()),
    }
    lines
}

fn card_line(label: &str, card: &PlayerCard) -> String {
    let strength = |value: Option<u32>| value.map_or("?".to_string(), |v| v.to_string());
    format!(
        "{label}: {} hp {} mana {} atk {} def {}",
        card.name,
        card.health,
        card.mana,
        strength(card.attack),
        strength(card.defense)
    )
}

pub fn battleground_lines(current: &str) -> Vec<String> {
    BATTLEGROUNDS
        .iter()
        .map(|ground| {
            let marker = if ground.id == current { '*' } else { ' ' };
            format!("{marker} {} ({})", ground.id, ground.name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_blockchain_core::{Address, Battle};
    use runtime::AlertKind;

    fn card(name: &str, reveal: bool) -> PlayerCard {
        PlayerCard {
            address: Address::new("0x01"),
            name: name.into(),
            health: 25,
            mana: 10,
            attack: reveal.then_some(7),
            defense: reveal.then_some(4),
        }
    }

    #[test]
    fn opponent_strengths_stay_hidden() {
        let view = BattleView {
            battle: Battle::pending("arena", Address::new("0x01")),
            local: card("alice", true),
            opponent: Some(card("bob", false)),
        };

        let lines = vitals_lines(&view);
        assert_eq!(lines[1], "you: alice hp 25 mana 10 atk 7 def 4");
        assert_eq!(lines[2], "opponent: bob hp 25 mana 10 atk ? def ?");
    }

    #[test]
    fn current_ground_is_marked() {
        let lines = battleground_lines("bg-astral");
        assert_eq!(lines.len(), BATTLEGROUNDS.len());
        assert!(lines.iter().any(|l| l == "* bg-astral (Astral)"));
    }

    #[test]
    fn alerts_show_their_kind() {
        let alert = AlertState {
            visible: true,
            kind: AlertKind::Success,
            message: "You won!".into(),
        };
        assert_eq!(alert_line(&alert), "[success] You won!");
    }

    #[test]
    fn battle_routes_name_the_battle() {
        assert_eq!(
            route_line(&Route::Battle("arena".into())),
            "-> battle arena (/battle/arena)"
        );
    }
}

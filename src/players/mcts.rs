use rand::Rng;

use crate::game::action::GameAction;
use crate::game::game::Game;
use crate::players::BasePlayer;
use crate::players::tree_search::{execute_spectrum, list_pruned_actions, random_playout};
use crate::types::Color;

pub const SIMULATIONS: usize = 10;
const EPSILON: f64 = 1e-8;

fn exp_c() -> f64 {
    2.0_f64.sqrt()
}

#[derive(Debug, Clone)]
pub struct MCTSPlayer {
    pub color: Color,
    pub num_simulations: usize,
    pub prunning: bool,
}

impl MCTSPlayer {
    pub fn new(color: Color, num_simulations: Option<usize>, prunning: Option<bool>) -> Self {
        Self {
            color,
            num_simulations: num_simulations.unwrap_or(SIMULATIONS),
            prunning: prunning.unwrap_or(false),
        }
    }
}

impl BasePlayer for MCTSPlayer {
    fn decide(&self, game: &Game, actions: &[GameAction]) -> Option<GameAction> {
        if actions.len() <= 1 {
            return actions.first().cloned();
        }
        let mut tree = SearchTree::new(self.color, game.copy(), self.prunning);
        for _ in 0..self.num_simulations {
            tree.run_simulation();
        }
        tree.choose_best_action(SearchTree::ROOT)
            .or_else(|| actions.first().cloned())
    }
}

type NodeIndex = usize;

struct StateNode {
    parent: Option<NodeIndex>,
    game: Game,
    /// Per action, its chance outcomes as `(child, probability)`.
    children: Vec<(GameAction, Vec<(NodeIndex, f64)>)>,
    wins: u32,
    visits: u32,
}

/// Nodes live in one arena and refer to each other by index.
struct SearchTree {
    color: Color,
    prunning: bool,
    nodes: Vec<StateNode>,
}

impl SearchTree {
    const ROOT: NodeIndex = 0;

    fn new(color: Color, game: Game, prunning: bool) -> Self {
        Self {
            color,
            prunning,
            nodes: vec![StateNode {
                parent: None,
                game,
                children: Vec::new(),
                wins: 0,
                visits: 0,
            }],
        }
    }

    fn is_leaf(&self, node: NodeIndex) -> bool {
        self.nodes[node].children.is_empty()
    }

    fn is_terminal(&self, node: NodeIndex) -> bool {
        self.nodes[node].game.winning_color().is_some()
    }

    /// Select down to a leaf, expand it once, play out from the chosen child
    /// and credit the result to the whole path.
    fn run_simulation(&mut self) {
        let mut node = Self::ROOT;
        self.nodes[node].visits += 1;
        while !self.is_leaf(node) {
            let Some(next) = self.select(node) else {
                break;
            };
            node = next;
            self.nodes[node].visits += 1;
        }

        if !self.is_terminal(node) {
            self.expand(node);
            if let Some(next) = self.select(node) {
                node = next;
                self.nodes[node].visits += 1;
            }
        }

        let won = random_playout(&self.nodes[node].game) == Some(self.color);
        self.backpropagate(node, won);
    }

    fn expand(&mut self, node: NodeIndex) {
        let game = &self.nodes[node].game;
        let actions = if self.prunning {
            list_pruned_actions(game)
        } else {
            game.state.legal_actions().to_vec()
        };

        let mut expanded = Vec::with_capacity(actions.len());
        for action in actions {
            let outcomes = execute_spectrum(&self.nodes[node].game, &action);
            let mut children = Vec::with_capacity(outcomes.len());
            for (game, proba) in outcomes {
                children.push((self.nodes.len(), proba));
                self.nodes.push(StateNode {
                    parent: Some(node),
                    game,
                    children: Vec::new(),
                    wins: 0,
                    visits: 0,
                });
            }
            expanded.push((action, children));
        }
        self.nodes[node].children = expanded;
    }

    /// Best action by UCT, then one of its outcomes sampled by probability.
    fn select(&self, node: NodeIndex) -> Option<NodeIndex> {
        let action = self.choose_best_action(node)?;
        let (_, children) = self.nodes[node]
            .children
            .iter()
            .find(|(candidate, _)| *candidate == action)?;

        let mut roll = rand::thread_rng().gen_range(0.0..1.0);
        for (child, proba) in children {
            if roll < *proba {
                return Some(*child);
            }
            roll -= proba;
        }
        children.last().map(|(child, _)| *child)
    }

    fn choose_best_action(&self, node: NodeIndex) -> Option<GameAction> {
        let mut best: Option<(&GameAction, f64)> = None;
        for (action, _) in &self.nodes[node].children {
            let score = self.action_children_expected_score(node, action);
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((action, score));
            }
        }
        best.map(|(action, _)| action.clone())
    }

    fn action_children_expected_score(&self, node: NodeIndex, action: &GameAction) -> f64 {
        let parent_visits = f64::from(self.nodes[node].visits);
        let Some((_, children)) = self.nodes[node]
            .children
            .iter()
            .find(|(candidate, _)| candidate == action)
        else {
            return 0.0;
        };
        children
            .iter()
            .map(|(child, proba)| {
                let child = &self.nodes[*child];
                let visits = f64::from(child.visits);
                let exploitation = f64::from(child.wins) / (visits + EPSILON);
                let exploration =
                    exp_c() * ((parent_visits + EPSILON).ln() / (visits + EPSILON)).sqrt();
                proba * (exploitation + exploration)
            })
            .sum()
    }

    fn backpropagate(&mut self, node: NodeIndex, won: bool) {
        if !won {
            return;
        }
        let mut current = Some(node);
        while let Some(index) = current {
            self.nodes[index].wins += 1;
            current = self.nodes[index].parent;
        }
    }
}

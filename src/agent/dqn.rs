use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use super::exploration::EpsilonSchedule;
use crate::config::Hyperparameters;
use crate::environment::{ActionSpace, Environment};
use crate::error::{DqnError, Result};
use crate::loss::Mse;
use crate::metrics::MetricsTracker;
use crate::network::{argmax, QNetwork};
use crate::optimizer::Adam;
use crate::replay_buffer::ReplayMemory;
use crate::types::{Action, Transition};

/// Outcome of one finished episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    /// Zero-based index over all episodes this agent has run.
    pub episode: usize,
    pub reward: f32,
    pub steps: usize,
    /// Epsilon after this episode's decay (unchanged in evaluation).
    pub epsilon: f32,
    /// Loss of the optimization step run at the end of the episode, if any.
    pub loss: Option<f32>,
    /// Whether the target network was synced at the end of the episode.
    pub synced: bool,
}

/// Deep Q-Network agent with a periodically synced target network.
///
/// ```rust
/// use qtrainer::agent::DqnAgent;
/// use qtrainer::config::Hyperparameters;
/// use qtrainer::environment::CartPole;
///
/// let hyperparameters = Hyperparameters::from_toml_str(r#"
///     [cartpole1]
///     replay_memory_size = 1000
///     mini_batch_size = 16
///     epsilon_init = 1.0
///     epsilon_decay = 0.99
///     epsilon_min = 0.05
///     network_sync_rate = 50
///     learning_rate_a = 0.001
///     discount_factor_g = 0.99
///     hidden_dim = 32
/// "#, "cartpole1").unwrap();
///
/// let mut env = CartPole::new(0);
/// let mut agent = DqnAgent::for_environment(hyperparameters, &env, 0).unwrap();
/// let summaries = agent.run(&mut env, true, Some(3)).unwrap();
/// assert_eq!(summaries.len(), 3);
/// ```
pub struct DqnAgent {
    hyperparameters: Hyperparameters,
    policy_network: QNetwork,
    target_network: QNetwork,
    optimizer: Adam,
    loss_fn: Mse,
    memory: ReplayMemory,
    epsilon: EpsilonSchedule,
    action_space: ActionSpace,
    /// Transitions stored since the last target sync.
    step_count: usize,
    episodes: usize,
    rng: StdRng,
    metrics: MetricsTracker,
}

impl DqnAgent {
    pub fn new(hyperparameters: Hyperparameters, num_states: usize, num_actions: usize, seed: u64) -> Result<Self> {
        hyperparameters.validate()?;
        if num_states == 0 {
            return Err(DqnError::config("num_states", "observation space must not be empty"));
        }
        if num_actions == 0 {
            return Err(DqnError::config("num_actions", "action space must not be empty"));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let policy_network = QNetwork::new(num_states, num_actions, hyperparameters.hidden_dim, &mut rng);
        let target_network = policy_network.clone();

        Ok(DqnAgent {
            optimizer: Adam::with_learning_rate(hyperparameters.learning_rate),
            loss_fn: Mse,
            memory: ReplayMemory::new(hyperparameters.replay_memory_size),
            epsilon: EpsilonSchedule::new(
                hyperparameters.epsilon_init,
                hyperparameters.epsilon_decay,
                hyperparameters.epsilon_min,
            ),
            action_space: ActionSpace::Discrete { n: num_actions },
            step_count: 0,
            episodes: 0,
            rng,
            metrics: MetricsTracker::new(),
            policy_network,
            target_network,
            hyperparameters,
        })
    }

    /// Size the networks from the environment's spaces.
    pub fn for_environment<E: Environment + ?Sized>(hyperparameters: Hyperparameters, env: &E, seed: u64) -> Result<Self> {
        let num_states = env.observation_space().dim();
        let num_actions = env.action_space().n();
        Self::new(hyperparameters, num_states, num_actions, seed)
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    pub fn policy_network(&self) -> &QNetwork {
        &self.policy_network
    }

    pub fn target_network(&self) -> &QNetwork {
        &self.target_network
    }

    pub fn memory(&self) -> &ReplayMemory {
        &self.memory
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon.value()
    }

    /// Transitions stored since the last target sync.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn episodes(&self) -> usize {
        self.episodes
    }

    pub fn metrics(&self) -> &MetricsTracker {
        &self.metrics
    }

    /// Epsilon-greedy while training, greedy otherwise.
    pub fn select_action(&mut self, state: ArrayView1<f32>, is_training: bool) -> Result<Action> {
        if is_training && self.rng.gen::<f32>() < self.epsilon.value() {
            Ok(self.action_space.sample(&mut self.rng))
        } else {
            self.greedy_action(state)
        }
    }

    /// Action with the highest policy value; ties go to the lowest index.
    pub fn greedy_action(&self, state: ArrayView1<f32>) -> Result<Action> {
        let q_values = self.policy_network.predict(state)?;
        argmax(q_values.view())
            .ok_or_else(|| DqnError::Numerical("policy network produced no action-values".to_string()))
    }

    /// Bootstrapped targets for a batch, read from the frozen target network.
    ///
    /// Terminal transitions yield exactly their reward.
    pub fn compute_targets(&self, batch: &[Transition]) -> Result<Array1<f32>> {
        let next_states = self.stack(batch.iter().map(|t| t.next_state.view()), batch.len())?;
        let next_q_values = self.target_network.predict_batch(next_states.view())?;
        let gamma = self.hyperparameters.discount_factor;

        Ok(batch
            .iter()
            .zip(next_q_values.rows())
            .map(|(transition, next_q)| {
                if transition.terminated {
                    transition.reward
                } else {
                    let max_next_q = next_q.iter().fold(f32::NEG_INFINITY, |max, &v| max.max(v));
                    transition.reward + gamma * max_next_q
                }
            })
            .collect())
    }

    /// One Adam step on the policy network over `batch`; returns the pre-update loss.
    ///
    /// The loss is the mean squared difference between the policy value of the
    /// action taken and its bootstrapped target.
    pub fn optimize(&mut self, batch: &[Transition]) -> Result<f32> {
        if batch.is_empty() {
            return Err(DqnError::InsufficientSamples { requested: 1, available: 0 });
        }

        let targets = self.compute_targets(batch)?;
        let states = self.stack(batch.iter().map(|t| t.state.view()), batch.len())?;
        let actions: Vec<Action> = batch.iter().map(|t| t.action).collect();

        let outputs = self.policy_network.forward_batch(states.view())?;
        let loss = self.loss_fn.compute(outputs.view(), &actions, targets.view())?;
        if !loss.is_finite() {
            warn!(loss, "non-finite loss, aborting optimization");
            return Err(DqnError::Numerical(format!("loss diverged to {}", loss)));
        }

        let output_gradient = self.loss_fn.gradient(outputs.view(), &actions, targets.view())?;
        let gradients = self.policy_network.backward_batch(output_gradient.view());
        self.policy_network.apply_gradients(&mut self.optimizer, &gradients);

        self.metrics.record_loss(loss);
        debug!(loss, batch_size = batch.len(), "optimization step");
        Ok(loss)
    }

    /// Copy the policy parameters into the target network.
    pub fn sync_target_network(&mut self) -> Result<()> {
        let parameters = self.policy_network.parameters();
        self.target_network.load_parameters(&parameters)?;
        self.metrics.record_target_sync();
        debug!(episode = self.episodes, "target network synced");
        Ok(())
    }

    /// Play one episode to termination or truncation.
    pub fn run_episode<E: Environment + ?Sized>(&mut self, env: &mut E, is_training: bool) -> Result<EpisodeSummary> {
        let num_states = self.policy_network.num_states();
        let (mut state, _info) = env.reset()?;
        if state.len() != num_states {
            return Err(DqnError::dimension_mismatch(num_states, state.len()));
        }

        let mut episode_reward = 0.0;
        let mut steps = 0;
        loop {
            let action = self.select_action(state.view(), is_training)?;
            let step = env.step(action)?;
            if step.observation.len() != num_states {
                return Err(DqnError::dimension_mismatch(num_states, step.observation.len()));
            }
            episode_reward += step.reward;
            steps += 1;

            if is_training {
                self.memory.append(Transition::new(
                    state,
                    action,
                    step.observation.clone(),
                    step.reward,
                    step.terminated,
                ));
                self.step_count += 1;
            }

            state = step.observation;
            if step.terminated || step.truncated {
                break;
            }
        }

        let episode = self.episodes;
        self.episodes += 1;
        self.metrics.record_episode(episode_reward, steps);

        let mut loss = None;
        let mut synced = false;
        if is_training {
            let epsilon = self.epsilon.decay();
            self.metrics.record_epsilon(epsilon);

            let batch_size = self.hyperparameters.mini_batch_size;
            if self.memory.len() >= batch_size {
                let batch: Vec<Transition> = self.memory
                    .sample(batch_size, &mut self.rng)?
                    .into_iter()
                    .cloned()
                    .collect();
                loss = Some(self.optimize(&batch)?);

                if self.step_count >= self.hyperparameters.network_sync_rate {
                    self.sync_target_network()?;
                    self.step_count = 0;
                    synced = true;
                }
            }
        }

        let summary = EpisodeSummary {
            episode,
            reward: episode_reward,
            steps,
            epsilon: self.epsilon.value(),
            loss,
            synced,
        };
        info!(
            episode = summary.episode,
            reward = summary.reward,
            epsilon = summary.epsilon,
            steps = summary.steps,
            "episode finished"
        );
        Ok(summary)
    }

    /// Run episodes until `should_stop` returns true for a finished episode.
    pub fn run_until<E, F>(&mut self, env: &mut E, is_training: bool, mut should_stop: F) -> Result<()>
    where
        E: Environment + ?Sized,
        F: FnMut(&EpisodeSummary) -> bool,
    {
        loop {
            let summary = self.run_episode(env, is_training)?;
            if should_stop(&summary) {
                return Ok(());
            }
        }
    }

    /// Run `max_episodes` episodes, or forever when `None`.
    pub fn run<E: Environment + ?Sized>(
        &mut self,
        env: &mut E,
        is_training: bool,
        max_episodes: Option<usize>,
    ) -> Result<Vec<EpisodeSummary>> {
        let mut summaries = Vec::new();
        if max_episodes == Some(0) {
            return Ok(summaries);
        }
        self.run_until(env, is_training, |summary| {
            summaries.push(summary.clone());
            max_episodes.map_or(false, |limit| summaries.len() >= limit)
        })?;
        Ok(summaries)
    }

    fn stack<'a, I>(&self, rows: I, len: usize) -> Result<Array2<f32>>
    where
        I: Iterator<Item = ArrayView1<'a, f32>>,
    {
        let num_states = self.policy_network.num_states();
        let mut stacked = Array2::zeros((len, num_states));
        for (i, row) in rows.enumerate() {
            if row.len() != num_states {
                return Err(DqnError::dimension_mismatch(num_states, row.len()));
            }
            stacked.row_mut(i).assign(&row);
        }
        Ok(stacked)
    }
}

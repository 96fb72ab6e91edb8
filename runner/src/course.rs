//! A headless endless-runner course: the agent runs along the
//! ground while obstacles scroll towards it at increasing speed.
//! All lengths are in pixels of an 800×600 screen, and one tick
//! is one frame at 60 frames per second.
use rexneat_nn::controller::{Action, Sensors};

use log::trace;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub const SCREEN_WIDTH: f32 = 800.0;
pub const SCREEN_HEIGHT: f32 = 600.0;
pub const TICKS_PER_SECOND: u64 = 60;

const GROUND: f32 = 500.0;
const AGENT_X: f32 = 50.0;
const RUN_SIZE: (f32, f32) = (44.0, 60.0);
const DUCK_SIZE: (f32, f32) = (59.0, 30.0);
const JUMP_VELOCITY: f32 = -16.0;
const GRAVITY: f32 = 0.5;

const BASE_SPEED: f32 = 10.0;
const MAX_SPEED: f32 = 25.0;
const SPEED_INCREMENT: f32 = 0.5;
const SPEED_INTERVAL: u64 = 450;
const SPAWN_INTERVAL: u32 = 60;
const BIRD_TOPS: [f32; 3] = [410.0, 385.0, 355.0];

/// Birds are drawn as often as all cacti together.
const SPAWN_TABLE: [ObstacleKind; 7] = [
    ObstacleKind::Bird,
    ObstacleKind::MixedCactus,
    ObstacleKind::Bird,
    ObstacleKind::LargeCactus,
    ObstacleKind::Bird,
    ObstacleKind::SmallCactus,
    ObstacleKind::Bird,
];

/// An axis-aligned box, `y` growing downwards.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Rect {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Rect {
    fn right(&self) -> f32 {
        self.x + self.width
    }

    fn bottom(&self) -> f32 {
        self.y + self.height
    }

    fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObstacleKind {
    SmallCactus,
    LargeCactus,
    MixedCactus,
    Bird,
}

impl ObstacleKind {
    /// Sensor code of the obstacle type.
    pub fn code(self) -> f32 {
        match self {
            ObstacleKind::SmallCactus => 0.2,
            ObstacleKind::LargeCactus => 0.4,
            ObstacleKind::MixedCactus => 0.6,
            ObstacleKind::Bird => 0.8,
        }
    }

    fn size(self) -> (f32, f32) {
        match self {
            ObstacleKind::SmallCactus => (17.0, 35.0),
            ObstacleKind::LargeCactus => (25.0, 50.0),
            ObstacleKind::MixedCactus => (75.0, 50.0),
            ObstacleKind::Bird => (46.0, 40.0),
        }
    }
}

#[derive(Clone, Debug)]
struct Obstacle {
    kind: ObstacleKind,
    rect: Rect,
}

impl Obstacle {
    fn spawn(kind: ObstacleKind, rng: &mut ChaCha8Rng) -> Obstacle {
        let (width, height) = kind.size();
        let y = match kind {
            ObstacleKind::Bird => *BIRD_TOPS.choose(rng).unwrap_or(&BIRD_TOPS[0]),
            _ => GROUND - height,
        };
        Obstacle {
            kind,
            rect: Rect {
                x: SCREEN_WIDTH,
                y,
                width,
                height,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentState {
    Jumping,
    Ducking,
    Running,
}

impl AgentState {
    pub fn code(self) -> f32 {
        match self {
            AgentState::Jumping => 0.0,
            AgentState::Ducking => 1.0,
            AgentState::Running => 2.0,
        }
    }
}

#[derive(Clone, Debug)]
struct Agent {
    state: AgentState,
    rect: Rect,
    velocity: f32,
}

impl Agent {
    fn new() -> Agent {
        Agent {
            state: AgentState::Running,
            rect: Self::grounded(RUN_SIZE),
            velocity: 0.0,
        }
    }

    fn grounded((width, height): (f32, f32)) -> Rect {
        Rect {
            x: AGENT_X,
            y: GROUND - height,
            width,
            height,
        }
    }

    /// Applies an action. A jump can't start mid-air or
    /// while ducking, and ducking can't start mid-air.
    fn act(&mut self, action: Action) {
        match (action, self.state) {
            (Action::Jump, AgentState::Running) => {
                self.state = AgentState::Jumping;
                self.velocity = JUMP_VELOCITY;
            }
            (Action::Duck, AgentState::Running) => {
                self.state = AgentState::Ducking;
                self.rect = Self::grounded(DUCK_SIZE);
            }
            (Action::Run, AgentState::Ducking) => {
                self.state = AgentState::Running;
                self.rect = Self::grounded(RUN_SIZE);
            }
            _ => {}
        }
    }

    fn update(&mut self) {
        if self.state == AgentState::Jumping {
            self.rect.y += self.velocity;
            self.velocity += GRAVITY;
            if self.rect.bottom() >= GROUND {
                self.rect.y = GROUND - self.rect.height;
                self.velocity = 0.0;
                self.state = AgentState::Running;
            }
        }
    }
}

/// One run of the course. Courses built from the same
/// seed present the same obstacles at the same ticks.
#[derive(Clone, Debug)]
pub struct Course {
    rng: ChaCha8Rng,
    agent: Agent,
    obstacles: Vec<Obstacle>,
    speed: f32,
    spawn_timer: u32,
    ticks: u64,
    crashed: bool,
}

impl Course {
    pub fn new(seed: u64) -> Course {
        Course {
            rng: ChaCha8Rng::seed_from_u64(seed),
            agent: Agent::new(),
            obstacles: vec![],
            speed: BASE_SPEED,
            spawn_timer: 0,
            ticks: 0,
            crashed: false,
        }
    }

    /// Runs the course until the agent crashes or `max_ticks`
    /// elapse, asking `policy` for an action every tick.
    /// Returns the survival time in seconds.
    pub fn run(seed: u64, max_ticks: u64, mut policy: impl FnMut(&Sensors) -> Action) -> f32 {
        let mut course = Course::new(seed);
        while !course.crashed && course.ticks < max_ticks {
            let action = policy(&course.sensors());
            course.step(action);
        }
        course.survival_time()
    }

    /// What the agent perceives: the nearest obstacle
    /// entirely ahead of it, plus its own state.
    pub fn sensors(&self) -> Sensors {
        let agent = &self.agent.rect;
        let next = self
            .obstacles
            .iter()
            .filter(|o| o.rect.x > agent.right())
            .min_by(|a, b| a.rect.x.total_cmp(&b.rect.x));

        let mut sensors = Sensors {
            distance: 1.0,
            speed: self.speed / MAX_SPEED,
            agent_x: agent.x / SCREEN_WIDTH,
            agent_y: agent.y / SCREEN_HEIGHT,
            agent_width: agent.width / SCREEN_WIDTH,
            agent_height: agent.height / SCREEN_HEIGHT,
            agent_state: self.agent.state.code(),
            ..Sensors::default()
        };
        if let Some(obstacle) = next {
            let rect = &obstacle.rect;
            sensors.distance = ((rect.x - agent.right()) / SCREEN_WIDTH).min(1.0);
            sensors.obstacle_type = obstacle.kind.code();
            sensors.obstacle_width = rect.width / SCREEN_WIDTH;
            sensors.obstacle_height = rect.height / SCREEN_HEIGHT;
            sensors.obstacle_x = rect.x / SCREEN_WIDTH;
            sensors.obstacle_y = rect.y / SCREEN_HEIGHT;
        }
        sensors
    }

    /// Advances the course by one tick. Returns
    /// whether the agent is still alive.
    pub fn step(&mut self, action: Action) -> bool {
        if self.crashed {
            return false;
        }
        self.agent.act(action);
        self.agent.update();

        self.spawn_timer += 1;
        if self.spawn_timer >= SPAWN_INTERVAL {
            self.spawn_timer = 0;
            let kind = *SPAWN_TABLE.choose(&mut self.rng).unwrap_or(&ObstacleKind::Bird);
            self.obstacles.push(Obstacle::spawn(kind, &mut self.rng));
        }
        for obstacle in &mut self.obstacles {
            obstacle.rect.x -= self.speed;
        }
        self.obstacles.retain(|o| o.rect.right() > 0.0);

        self.ticks += 1;
        if self.ticks % SPEED_INTERVAL == 0 && self.speed <= MAX_SPEED {
            self.speed += SPEED_INCREMENT;
        }

        if let Some(obstacle) = self.obstacles.iter().find(|o| o.rect.overlaps(&self.agent.rect)) {
            trace!(
                "agent crashed into {:?} after {} ticks",
                obstacle.kind,
                self.ticks
            );
            self.crashed = true;
        }
        !self.crashed
    }

    pub fn survival_time(&self) -> f32 {
        self.ticks as f32 / TICKS_PER_SECOND as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_obstacle(kind: ObstacleKind, y: f32) -> Course {
        let mut course = Course::new(0);
        let (width, height) = kind.size();
        course.obstacles.push(Obstacle {
            kind,
            rect: Rect {
                x: AGENT_X + RUN_SIZE.0 + 100.0,
                y,
                width,
                height,
            },
        });
        course
    }

    #[test]
    fn empty_course_senses_nothing_ahead() {
        let sensors = Course::new(3).sensors();
        assert_eq!(sensors.distance, 1.0);
        assert_eq!(sensors.obstacle_type, 0.0);
        assert_eq!(sensors.speed, BASE_SPEED / MAX_SPEED);
        assert_eq!(sensors.agent_state, 2.0);
        assert_eq!(sensors.agent_x, AGENT_X / SCREEN_WIDTH);
    }

    #[test]
    fn nearest_obstacle_is_sensed() {
        let course = with_obstacle(ObstacleKind::LargeCactus, GROUND - 50.0);
        let sensors = course.sensors();
        assert!((sensors.distance - 100.0 / SCREEN_WIDTH).abs() < 1e-6);
        assert_eq!(sensors.obstacle_type, 0.4);
        assert_eq!(sensors.obstacle_height, 50.0 / SCREEN_HEIGHT);
    }

    #[test]
    fn running_into_a_cactus_crashes() {
        let mut course = with_obstacle(ObstacleKind::SmallCactus, GROUND - 35.0);
        while course.step(Action::Run) {}
        assert!(course.crashed);
        // The 100 pixel gap closes after 10 ticks; contact is on the next.
        assert_eq!(course.ticks, 11);
        assert!(!course.step(Action::Run));
        assert_eq!(course.ticks, 11);
    }

    #[test]
    fn jumping_clears_a_cactus() {
        let mut course = with_obstacle(ObstacleKind::SmallCactus, GROUND - 35.0);
        course.step(Action::Jump);
        assert_eq!(course.agent.state, AgentState::Jumping);
        assert_eq!(course.sensors().agent_state, 0.0);
        for _ in 0..30 {
            assert!(course.step(Action::Duck));
        }
        // Ducking is refused mid-air.
        assert_eq!(course.agent.state, AgentState::Jumping);
    }

    #[test]
    fn jump_lands_back_on_the_ground() {
        let mut course = Course::new(0);
        course.step(Action::Jump);
        let mut airborne = 0;
        while course.agent.state == AgentState::Jumping {
            course.agent.update();
            airborne += 1;
        }
        assert!(airborne > 50);
        assert_eq!(course.agent.rect.bottom(), GROUND);
    }

    #[test]
    fn ducking_passes_under_a_low_bird() {
        let mut ducking = with_obstacle(ObstacleKind::Bird, BIRD_TOPS[0]);
        while ducking.ticks < 20 {
            assert!(ducking.step(Action::Duck));
        }
        assert_eq!(ducking.agent.state, AgentState::Ducking);
        assert_eq!(ducking.sensors().agent_state, 1.0);

        let mut running = with_obstacle(ObstacleKind::Bird, BIRD_TOPS[0]);
        while running.step(Action::Run) {}
        assert!(running.crashed);
    }

    #[test]
    fn no_jump_while_ducking() {
        let mut course = Course::new(0);
        course.step(Action::Duck);
        course.step(Action::Jump);
        assert_eq!(course.agent.state, AgentState::Ducking);
        course.step(Action::Run);
        assert_eq!(course.agent.state, AgentState::Running);
    }

    #[test]
    fn speed_increases_over_time() {
        let mut course = Course::new(0);
        course.obstacles.clear();
        for _ in 0..SPEED_INTERVAL {
            course.step(Action::Run);
            course.obstacles.clear();
        }
        assert_eq!(course.speed, BASE_SPEED + SPEED_INCREMENT);
    }

    #[test]
    fn same_seed_same_outcome() {
        let jumper = |s: &Sensors| {
            if s.distance < 0.15 && s.obstacle_type < 0.7 {
                Action::Jump
            } else if s.obstacle_type > 0.7 && s.distance < 0.1 {
                Action::Duck
            } else {
                Action::Run
            }
        };
        let a = Course::run(11, 5_000, jumper);
        let b = Course::run(11, 5_000, jumper);
        assert_eq!(a, b);
        assert!(a > 0.0);
    }

    #[test]
    fn run_stops_at_tick_limit() {
        // Nothing spawns before the first interval.
        let time = Course::run(0, 30, |_| Action::Run);
        assert_eq!(time, 0.5);
    }
}

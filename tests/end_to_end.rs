use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use inkclock::testing::{
    FixedPresence, ManualClock, MemoryAudio, MemoryCalendar, MemoryCompositor, MemoryDisplay,
    PanelOp,
};
use inkclock::{
    AlarmController, AlarmOutcome, Banner, Bus, ButtonEdge, CalendarService, Clock, Config,
    Continuation, DisplayCoordinator, Event, Inbox, RadioState, Scheduler, TaskFn, Topic, hhmm,
};

struct Clockwork {
    sched: Scheduler,
    clock: ManualClock,
    bus: Bus,
    calendar: MemoryCalendar,
    audio: MemoryAudio,
    panel: MemoryDisplay,
    faces: MemoryCompositor,
    observed: Inbox,
}

impl Clockwork {
    fn new(start: DateTime<Utc>) -> Self {
        let cfg = Config::default();
        let clock = ManualClock::new(start);
        let bus = Bus::new();
        let calendar = MemoryCalendar::with_calendar(&cfg.calendar.name);
        let audio = MemoryAudio::default();
        let panel = MemoryDisplay::default();
        let faces = MemoryCompositor::default();

        let observed = bus.inbox("observer");
        bus.subscribe_all(&observed, &[Topic::EventStarted, Topic::Radio, Topic::Alarm]);

        let mut sched = Scheduler::new(cfg.scheduler.quantum());
        sched.add(Box::new(CalendarService::new(
            Box::new(calendar.clone()),
            bus.clone(),
            &cfg.calendar,
        )));
        sched.add(Box::new(AlarmController::new(
            Box::new(audio.clone()),
            bus.clone(),
            &cfg.alarm,
        )));
        sched.add(Box::new(DisplayCoordinator::new(
            Box::new(panel.clone()),
            Box::new(faces.clone()),
            Box::new(FixedPresence::new(true)),
            &bus,
            &cfg.display,
            start,
        )));

        Self {
            sched,
            clock,
            bus,
            calendar,
            audio,
            panel,
            faces,
            observed,
        }
    }

    async fn cycle_at(&mut self, at: DateTime<Utc>) {
        self.clock.set(at);
        let report = self.sched.run_cycle(self.clock.now()).await;
        assert_eq!(report.faulted, 0);
    }

    fn banner(&self) -> Option<Banner> {
        self.faces.last_face().map(|f| f.banner)
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 6, 55, 0).unwrap()
}

#[tokio::test]
async fn calendar_event_rings_alarm_and_updates_panel() {
    let start = t0() + TimeDelta::minutes(5);
    let mut cw = Clockwork::new(t0());
    cw.calendar.set_occurrences([start]);

    // first cycle: fetch, bell appears
    cw.cycle_at(t0()).await;
    assert_eq!(cw.sched.len(), 3);
    assert_eq!(cw.banner(), Some(Banner::Alert { time_label: hhmm(start) }));
    assert!(cw.observed.drain().is_none());

    for m in 1..5 {
        cw.cycle_at(t0() + TimeDelta::minutes(m)).await;
    }
    assert!(!cw.audio.is_playing());
    let full_before = cw.panel.count(PanelOp::Full);
    cw.panel.clear_ops();

    // occurrence starts: alarm rings at volume 0, display redraws right away
    cw.cycle_at(start).await;
    assert_eq!(cw.observed.drain(), Some(Event::EventStarted(start)));
    assert_eq!(cw.observed.drain(), Some(Event::Radio(RadioState::On)));
    assert!(cw.audio.is_playing());
    assert_eq!(cw.audio.volume(), 0);
    assert_eq!(cw.panel.count(PanelOp::Partial), 1);
    assert_eq!(cw.panel.count(PanelOp::Full), 0);
    assert!(full_before >= 1);

    let face = cw.faces.last_face().unwrap();
    assert_eq!(face.banner, Banner::None);
    assert_eq!(face.song.as_deref(), Some("[Unknown] - [Unknown]"));

    // ramp: one step per cycle while ringing
    cw.cycle_at(start + TimeDelta::seconds(1)).await;
    cw.cycle_at(start + TimeDelta::seconds(2)).await;
    assert_eq!(cw.audio.volume(), 2);

    // rings for 30 minutes, then expires on its own
    cw.cycle_at(start + TimeDelta::minutes(30) - TimeDelta::seconds(1)).await;
    assert!(cw.audio.is_playing());
    assert!(cw.observed.drain().is_none());

    cw.cycle_at(start + TimeDelta::minutes(30)).await;
    assert!(!cw.audio.is_playing());
    assert_eq!(cw.observed.drain(), Some(Event::Radio(RadioState::Off)));
    assert_eq!(cw.observed.drain(), Some(Event::Alarm(AlarmOutcome::Expired)));
    assert_eq!(cw.faces.last_face().and_then(|f| f.song), None);
}

#[tokio::test]
async fn silence_button_cancels_a_ringing_alarm() {
    let start = t0() + TimeDelta::minutes(1);
    let mut cw = Clockwork::new(t0());
    cw.calendar.set_occurrences([start]);

    cw.cycle_at(t0()).await;
    cw.cycle_at(start).await;
    assert!(cw.audio.is_playing());
    let _ = cw.observed.drain_all().count();

    cw.bus.publish(Event::SilenceAlarm(ButtonEdge::Pressed));
    cw.cycle_at(start + TimeDelta::minutes(2)).await;

    assert!(!cw.audio.is_playing());
    assert_eq!(cw.observed.drain(), Some(Event::Radio(RadioState::Off)));
    assert_eq!(cw.observed.drain(), Some(Event::Alarm(AlarmOutcome::Canceled)));
}

#[tokio::test]
async fn calendar_outage_shows_warning_then_clears() {
    let mut cw = Clockwork::new(t0());
    cw.calendar.fail_auth(Some(inkclock::CalendarError::AuthFailure {
        reason: "401".into(),
    }));

    cw.cycle_at(t0()).await;
    assert_eq!(
        cw.banner(),
        Some(Banner::Warning {
            message: "Failed to login".into()
        })
    );

    cw.calendar.fail_auth(None);
    cw.cycle_at(t0() + TimeDelta::minutes(15)).await;
    assert_eq!(cw.banner(), Some(Banner::None));
    assert_eq!(cw.calendar.logins(), 2);
}

#[tokio::test]
async fn faulty_task_does_not_stall_services() {
    let mut cw = Clockwork::new(t0());
    cw.sched.add(TaskFn::boxed("flaky", |_now| -> Continuation {
        panic!("sensor unplugged");
    }));

    let report = cw.sched.run_cycle(t0()).await;
    assert_eq!(report.ticked, 4);
    assert_eq!(report.faulted, 1);
    assert_eq!(cw.sched.len(), 4);
    assert_eq!(cw.calendar.searches().len(), 1);
    assert_eq!(cw.sched.quantum(), Duration::from_secs(1));
}

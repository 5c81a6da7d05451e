//! Journey: build the review queue for a learner a week before the exam

use chrono::Duration;
use revise_core::QueueConfig;
use revise_e2e_tests::harness::{fixed_now, TestDatabaseManager};
use revise_e2e_tests::mocks::{BatchConfig, TestDataFactory};

fn topics(records: &[revise_core::TopicMasteryRecord]) -> Vec<&str> {
    records.iter().map(|r| r.topic.as_str()).collect()
}

#[test]
fn test_exam_week_queue() {
    let db = TestDatabaseManager::new_temp();
    TestDataFactory::create_exam_week_scenario(&db.store, "learner-1", fixed_now());

    let queue = db
        .store
        .review_queue("learner-1", fixed_now(), &QueueConfig::default())
        .unwrap();

    assert_eq!(topics(&queue.due_now), vec!["Kinematics", "Optics", "Moles"]);
    // The seven-day boundary is inclusive; Genetics is three weeks out
    assert_eq!(topics(&queue.upcoming), vec!["Bonding", "Cells"]);
    assert_eq!(queue.total_topics, 6);
    assert_eq!(queue.readiness, 62);

    let biology = &queue.subjects["Biology"];
    assert_eq!(biology.topics, 2);
    assert_eq!(biology.average_mastery, 93);
    assert_eq!(biology.total_xp, 350);

    let physics = &queue.subjects["Physics"];
    assert_eq!(physics.average_mastery, 48);
    assert_eq!(physics.total_xp, 125);

    assert_eq!(queue.subjects["Chemistry"].average_mastery, 46);
    assert_eq!(
        queue.subjects.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["Biology", "Chemistry", "Physics"]
    );
}

#[test]
fn test_reviewing_moves_topic_out_of_due_now() {
    let db = TestDatabaseManager::new_temp();
    let scenario = TestDataFactory::create_exam_week_scenario(&db.store, "learner-1", fixed_now());

    db.store
        .record_review(scenario.key("overdue_oldest"), 5, fixed_now())
        .unwrap();

    let queue = db
        .store
        .review_queue("learner-1", fixed_now(), &QueueConfig::default())
        .unwrap();

    assert_eq!(topics(&queue.due_now), vec!["Optics", "Moles"]);
    assert!(topics(&queue.upcoming).contains(&"Kinematics"));
    // 35 + 8 mastery, 40 + 25 XP
    assert_eq!(queue.subjects["Physics"].average_mastery, 52);
    assert_eq!(queue.subjects["Physics"].total_xp, 150);
}

#[test]
fn test_caps_and_window_are_configurable() {
    let db = TestDatabaseManager::new_temp();
    TestDataFactory::create_exam_week_scenario(&db.store, "learner-1", fixed_now());

    let config = QueueConfig {
        due_limit: 2,
        upcoming_limit: 1,
        upcoming_window_days: 30,
    };
    let queue = db.store.review_queue("learner-1", fixed_now(), &config).unwrap();

    assert_eq!(topics(&queue.due_now), vec!["Kinematics", "Optics"]);
    assert_eq!(topics(&queue.upcoming), vec!["Bonding"]);
    // Caps never change the aggregates
    assert_eq!(queue.total_topics, 6);
    assert_eq!(queue.readiness, 62);
}

#[test]
fn test_large_batch_respects_default_caps() {
    let db = TestDatabaseManager::new_temp();
    let config = BatchConfig {
        count: 120,
        ..Default::default()
    };
    TestDataFactory::create_batch(&db.store, &config, fixed_now());

    let now = fixed_now();
    let queue = db
        .store
        .review_queue("learner-1", now, &QueueConfig::default())
        .unwrap();

    assert_eq!(queue.total_topics, 120);
    assert_eq!(queue.due_now.len(), 15);
    assert_eq!(queue.upcoming.len(), 10);
    assert!(queue.due_now.iter().all(|r| r.next_review <= now));
    assert!(queue
        .upcoming
        .iter()
        .all(|r| r.next_review > now && r.next_review <= now + Duration::days(7)));
    assert!(queue.due_now.windows(2).all(|w| w[0].next_review <= w[1].next_review));
    assert!(queue.upcoming.windows(2).all(|w| w[0].next_review <= w[1].next_review));
}

#[test]
fn test_unknown_learner_gets_empty_queue() {
    let db = TestDatabaseManager::new_temp();
    let queue = db
        .store
        .review_queue("nobody", fixed_now(), &QueueConfig::default())
        .unwrap();

    assert!(queue.is_clear());
    assert!(queue.subjects.is_empty());
    assert_eq!(queue.readiness, 0);
    assert_eq!(queue.total_topics, 0);
}

#[test]
fn test_queue_json_shape() {
    let db = TestDatabaseManager::new_temp();
    TestDataFactory::create_exam_week_scenario(&db.store, "learner-1", fixed_now());
    let queue = db
        .store
        .review_queue("learner-1", fixed_now(), &QueueConfig::default())
        .unwrap();

    let json = serde_json::to_value(&queue).unwrap();
    assert_eq!(json["readiness"], 62);
    assert_eq!(json["dueNow"].as_array().unwrap().len(), 3);
    assert_eq!(json["dueNow"][0]["topic"], "Kinematics");
    assert_eq!(json["dueNow"][0]["masteryScore"], 35);
    assert_eq!(json["subjects"]["Biology"]["averageMastery"], 93);
    assert_eq!(json["subjects"]["Biology"]["totalXP"], 350);
}

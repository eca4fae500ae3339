use super::notifier::EmailMessage;
use crate::modules::accounts::model::{Account, Status};

/// Link a student follows to set their password
pub fn registration_link(client_url: &str, account_id: &str) -> String {
    format!(
        "{}/complete-registration/{}",
        client_url.trim_end_matches('/'),
        account_id
    )
}

/// Sent to a student an admin added directly
pub fn invitation(app_name: &str, student: &Account, link: &str) -> EmailMessage {
    EmailMessage {
        to: student.email.clone(),
        subject: format!("Welcome to {}", app_name),
        body: format!(
            "Hi {},\n\n\
            You have been added to the platform. Complete your registration here: {}",
            student.first_name, link
        ),
    }
}

/// Sent to the admin address when a student asks to join
pub fn registration_request(admin_email: &str, student: &Account) -> EmailMessage {
    EmailMessage {
        to: admin_email.to_string(),
        subject: "New Student Registration Request".to_string(),
        body: format!(
            "A new student, {} {} ({}), has requested registration. \
            Please review their request in the admin panel.",
            student.first_name, student.last_name, student.email
        ),
    }
}

pub fn review_approved(student: &Account, link: &str) -> EmailMessage {
    EmailMessage {
        to: student.email.clone(),
        subject: "Registration Approved".to_string(),
        body: format!(
            "Hi {},\n\n\
            Your registration request has been approved. Complete your registration here: {}",
            student.first_name, link
        ),
    }
}

pub fn review_rejected(student: &Account) -> EmailMessage {
    EmailMessage {
        to: student.email.clone(),
        subject: "Registration Rejected".to_string(),
        body: format!(
            "Hi {},\n\n\
            Your registration request has been declined. \
            Please contact support for further assistance.",
            student.first_name
        ),
    }
}

/// Notice for a manual status change
pub fn status_changed(student: &Account, status: Status) -> EmailMessage {
    let (subject, text) = match status {
        Status::Confirmed => (
            "Your Registration is Confirmed",
            "Your registration has been confirmed. Welcome to the platform!",
        ),
        Status::Rejected => (
            "Your Registration Request Was Rejected",
            "Unfortunately, your registration request was rejected. \
            Please contact support for further information.",
        ),
        Status::Pending => (
            "Your Registration Request Is Under Review",
            "Your registration request is now under review. \
            Please wait for confirmation from the admin.",
        ),
    };

    EmailMessage {
        to: student.email.clone(),
        subject: subject.to_string(),
        body: format!("Hi {},\n\n{}\n", student.first_name, text),
    }
}

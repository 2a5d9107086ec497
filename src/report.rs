use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{Category, CategoryEligibility, EligibilityResult, StudentHandle};
use crate::request::REQUEST_MARKER;

fn address(handle: &StudentHandle, domain: &str) -> String {
    format!("{handle}@{domain}")
}

fn closing_message(output: &mut String, domain: &str) {
    let _ = writeln!(output, "Good luck with your project!");
    let _ = writeln!(
        output,
        "If you would like to search for more potential teammates, \
         please create a new issue with the template title:"
    );
    let _ = writeln!(output, "\"{REQUEST_MARKER} your-kth-email@{domain}\".");
}

pub fn build_report(result: &EligibilityResult, domain: &str, generated_on: NaiveDate) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Legal Teammates");
    let _ = writeln!(
        output,
        "Generated for {} on {}",
        address(&result.requester, domain),
        generated_on
    );
    let _ = writeln!(output);

    for category in Category::ALL {
        match result.get(category) {
            Some(CategoryEligibility::AlreadyCompleted) => {
                let _ = writeln!(output, "- {category}: already completed");
            }
            Some(CategoryEligibility::Eligible(handles)) if handles.is_empty() => {
                let _ = writeln!(output, "- {category}: no eligible teammates right now");
            }
            Some(CategoryEligibility::Eligible(handles)) => {
                let addresses: Vec<String> =
                    handles.iter().map(|handle| address(handle, domain)).collect();
                let _ = writeln!(output, "- {category}: {}", addresses.join(", "));
            }
            None => {}
        }
    }

    let _ = writeln!(output);
    closing_message(&mut output, domain);
    output
}

pub fn unknown_requester_notice(requester: &StudentHandle, domain: &str) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Could not find {} on the course roster, so no teammates were looked up.",
        address(requester, domain)
    );
    let _ = writeln!(
        output,
        "Please check the address in the issue title and make sure you are registered."
    );
    let _ = writeln!(output);
    closing_message(&mut output, domain);
    output
}
